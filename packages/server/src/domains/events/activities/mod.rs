//! Event domain activities - business logic functions

mod get_event;
mod subscribe;

pub use get_event::{get_event_location, lookup_address};
pub use subscribe::{subscribe_event, SubscribeError, MAX_MEMBERSHIP_ATTEMPTS};
