// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Business rules (membership, settlement) live in domain functions that use these traits.
//
// Naming convention: Base* for trait names (e.g., BaseGeocoder, BaseEventStore)

use anyhow::Result;
use async_trait::async_trait;

use crate::common::utils::{CallerTag, Coordinates};
use crate::common::{EventId, MemberId, PaymentId};
use crate::domains::events::models::{EventLocation, Membership};
use crate::domains::payments::models::{Payment, PaymentStatus};

// =============================================================================
// Geocoding Trait (Infrastructure - address to coordinates)
// =============================================================================

#[async_trait]
pub trait BaseGeocoder: Send + Sync {
    /// Short provider name used in logs and combined errors
    fn name(&self) -> &'static str;

    /// Resolve a free-form address to a single point
    async fn geocode(&self, address: &str, caller: CallerTag) -> Result<Coordinates>;
}

// =============================================================================
// Event Store Trait (Infrastructure - event persistence)
// =============================================================================

#[async_trait]
pub trait BaseEventStore: Send + Sync {
    /// Active (not deleted, not ended) events that still have no coordinates
    async fn find_active_missing_coordinates(&self) -> Result<Vec<EventLocation>>;

    /// Persist resolved coordinates for an event
    async fn set_coordinates(&self, event_id: EventId, coordinates: Coordinates) -> Result<()>;

    async fn find_location(&self, event_id: EventId) -> Result<Option<EventLocation>>;

    async fn load_membership(&self, event_id: EventId) -> Result<Option<Membership>>;

    /// Compare-and-swap write keyed on `membership.version`.
    ///
    /// Returns `false` when the stored version moved on since the load.
    async fn persist_membership(&self, membership: &Membership) -> Result<bool>;

    /// Record a user as paid for an event. Repeated calls are no-ops.
    async fn add_paid_user(&self, event_id: EventId, user_id: MemberId) -> Result<()>;
}

// =============================================================================
// Payment Store Trait (Infrastructure - payment persistence)
// =============================================================================

#[async_trait]
pub trait BasePaymentStore: Send + Sync {
    async fn find_payment(&self, payment_id: PaymentId) -> Result<Option<Payment>>;

    async fn update_status(&self, payment_id: PaymentId, status: PaymentStatus) -> Result<()>;
}
