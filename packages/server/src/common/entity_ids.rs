//! Typed ID definitions for all domain entities.
//!
//! # Example
//!
//! ```rust
//! use sportify_core::common::{EventId, MemberId};
//!
//! let event_id: EventId = EventId::new();
//! let member_id: MemberId = MemberId::new();
//!
//! // This would be a compile error:
//! // let wrong: EventId = member_id;
//! # let _ = (event_id, member_id);
//! ```

pub use super::id::Id;

// ============================================================================
// Entity marker types
// ============================================================================

/// Marker type for sports events.
pub struct Event;

/// Marker type for platform users (event creators and participants).
pub struct Member;

/// Marker type for event payments.
pub struct Payment;

// ============================================================================
// Type aliases - the primary API
// ============================================================================

/// Typed ID for Event entities.
pub type EventId = Id<Event>;

/// Typed ID for Member entities.
pub type MemberId = Id<Member>;

/// Typed ID for Payment entities.
pub type PaymentId = Id<Payment>;
