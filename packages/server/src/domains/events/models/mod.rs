pub mod event;
pub mod membership;

pub use event::EventLocation;
pub use membership::{apply_membership_change, Membership, MembershipError};
