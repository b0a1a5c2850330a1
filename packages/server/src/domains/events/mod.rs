//! Events domain - event locations and membership
//!
//! Reads feed the coordinate queue; membership changes go through the pure
//! ledger in `models::membership` and a compare-and-swap write.

pub mod activities;
pub mod models;

// Re-export commonly used types
pub use activities::*;
pub use models::{apply_membership_change, EventLocation, Membership, MembershipError};
