//! Subscribe to / unsubscribe from an event

use thiserror::Error;
use tracing::{info, warn};

use crate::common::{EventId, MemberId};
use crate::domains::events::models::{apply_membership_change, Membership, MembershipError};
use crate::kernel::ServerDeps;

/// How many times a membership change is retried after losing a write race
pub const MAX_MEMBERSHIP_ATTEMPTS: usize = 3;

#[derive(Debug, Error)]
pub enum SubscribeError {
    #[error("event {0} not found")]
    EventNotFound(EventId),
    #[error(transparent)]
    Membership(#[from] MembershipError),
    #[error("membership of event {0} kept changing, giving up")]
    Conflict(EventId),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Load, change and write back an event's membership.
///
/// The write only succeeds if nobody changed the membership in between;
/// otherwise the whole sequence starts again from a fresh load.
pub async fn subscribe_event(
    event_id: EventId,
    user_id: MemberId,
    subscribe: bool,
    deps: &ServerDeps,
) -> Result<Membership, SubscribeError> {
    for attempt in 1..=MAX_MEMBERSHIP_ATTEMPTS {
        let current = deps
            .events
            .load_membership(event_id)
            .await?
            .ok_or(SubscribeError::EventNotFound(event_id))?;

        let updated = apply_membership_change(&current, user_id, subscribe)?;

        if deps.events.persist_membership(&updated).await? {
            info!(
                event_id = %event_id,
                user_id = %user_id,
                subscribe,
                busy = updated.busy,
                "membership updated"
            );
            return Ok(Membership {
                version: updated.version + 1,
                ..updated
            });
        }

        warn!(event_id = %event_id, attempt, "membership changed concurrently, retrying");
    }

    Err(SubscribeError::Conflict(event_id))
}
