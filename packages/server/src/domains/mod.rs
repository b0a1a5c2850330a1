pub mod events;
pub mod payments;
