use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;

use crate::common::{EventId, MemberId};

/// Participants of an event together with its occupancy.
///
/// `busy` always equals `participant_ids.len()`, and never exceeds `capacity`
/// when one is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Membership {
    #[sqlx(rename = "id")]
    pub event_id: EventId,
    /// `None` means unlimited
    pub capacity: Option<i32>,
    pub busy: i32,
    pub participant_ids: Vec<MemberId>,
    /// Row version, bumped on every successful write
    pub version: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MembershipError {
    #[error("user is already subscribed to the event")]
    AlreadyMember,
    #[error("all places in the event are taken")]
    AtCapacity,
    #[error("user is not subscribed to the event")]
    NotMember,
}

impl Membership {
    pub fn is_member(&self, participant: MemberId) -> bool {
        self.participant_ids.contains(&participant)
    }
}

/// Add or remove a participant, returning the new membership.
///
/// The input is never modified; on error the caller still holds the
/// membership exactly as loaded. The returned value keeps the input's
/// `version` so it can be written back with a compare-and-swap.
pub fn apply_membership_change(
    membership: &Membership,
    participant: MemberId,
    want_subscribed: bool,
) -> Result<Membership, MembershipError> {
    let mut participant_ids = membership.participant_ids.clone();

    if want_subscribed {
        if membership.is_member(participant) {
            return Err(MembershipError::AlreadyMember);
        }
        if let Some(capacity) = membership.capacity {
            if membership.busy >= capacity {
                return Err(MembershipError::AtCapacity);
            }
        }
        participant_ids.push(participant);
    } else {
        let position = participant_ids
            .iter()
            .position(|id| *id == participant)
            .ok_or(MembershipError::NotMember)?;
        participant_ids.remove(position);
    }

    Ok(Membership {
        event_id: membership.event_id,
        capacity: membership.capacity,
        busy: participant_ids.len() as i32,
        participant_ids,
        version: membership.version,
    })
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Membership {
    pub async fn find_by_event(event_id: EventId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT id, capacity, busy, participant_ids, version
             FROM events
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(event_id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Write participants and occupancy if nobody else wrote since the load.
    ///
    /// Returns `false` on a version conflict (or if the event vanished).
    pub async fn compare_and_swap(&self, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE events
             SET participant_ids = $2, busy = $3, version = version + 1, updated_at = NOW()
             WHERE id = $1 AND version = $4 AND deleted_at IS NULL",
        )
        .bind(self.event_id)
        .bind(&self.participant_ids)
        .bind(self.busy)
        .bind(self.version)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn membership(capacity: Option<i32>, participants: Vec<MemberId>) -> Membership {
        Membership {
            event_id: EventId::new(),
            capacity,
            busy: participants.len() as i32,
            participant_ids: participants,
            version: 7,
        }
    }

    #[test]
    fn test_subscribe_appends_and_recounts() {
        let a = MemberId::new();
        let before = membership(Some(3), vec![]);

        let after = apply_membership_change(&before, a, true).unwrap();

        assert_eq!(after.participant_ids, vec![a]);
        assert_eq!(after.busy, 1);
        assert_eq!(after.version, before.version);
        assert!(before.participant_ids.is_empty());
    }

    #[test]
    fn test_capacity_two_scenario() {
        let (a, b, c) = (MemberId::new(), MemberId::new(), MemberId::new());
        let empty = membership(Some(2), vec![]);

        let one = apply_membership_change(&empty, a, true).unwrap();
        let two = apply_membership_change(&one, b, true).unwrap();
        let err = apply_membership_change(&two, c, true).unwrap_err();

        assert_eq!(err, MembershipError::AtCapacity);
        assert_eq!(two.participant_ids, vec![a, b]);
        assert_eq!(two.busy, 2);
    }

    #[test]
    fn test_double_subscribe_is_rejected() {
        let a = MemberId::new();
        let full = membership(Some(1), vec![a]);

        // Membership is reported before occupancy
        assert_eq!(
            apply_membership_change(&full, a, true).unwrap_err(),
            MembershipError::AlreadyMember
        );
    }

    #[test]
    fn test_unlimited_capacity() {
        let mut current = membership(None, vec![]);
        for _ in 0..50 {
            current = apply_membership_change(&current, MemberId::new(), true).unwrap();
        }
        assert_eq!(current.busy, 50);
        assert_eq!(current.busy as usize, current.participant_ids.len());
    }

    #[test]
    fn test_unsubscribe_removes_only_that_member() {
        let (a, b, c) = (MemberId::new(), MemberId::new(), MemberId::new());
        let before = membership(Some(5), vec![a, b, c]);

        let after = apply_membership_change(&before, b, false).unwrap();

        assert_eq!(after.participant_ids, vec![a, c]);
        assert_eq!(after.busy, 2);
    }

    #[test]
    fn test_unsubscribe_non_member_is_rejected() {
        let a = MemberId::new();
        let before = membership(Some(2), vec![a]);

        let err = apply_membership_change(&before, MemberId::new(), false).unwrap_err();

        assert_eq!(err, MembershipError::NotMember);
        assert_eq!(before.participant_ids, vec![a]);
        assert_eq!(before.busy, 1);
    }
}
