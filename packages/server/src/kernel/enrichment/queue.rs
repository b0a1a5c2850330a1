//! Deduplicating FIFO of events waiting for coordinates.
//!
//! An event ID is *tracked* from the moment it is queued until its
//! coordinates are persisted, including the time its task is in flight.
//! While tracked it cannot be queued a second time.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::common::utils::{CallerTag, Coordinates};
use crate::common::EventId;
use crate::domains::events::models::EventLocation;
use crate::kernel::{BaseEventStore, CoordinateResolver};

/// A pending coordinate lookup
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentTask {
    pub event_id: EventId,
    pub address: String,
    /// Failed lookups so far
    pub attempts: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueCounts {
    pub queued: usize,
    pub tracked: usize,
}

/// Result of one consumer step
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    Resolved {
        event_id: EventId,
        coordinates: Coordinates,
    },
    Requeued {
        event_id: EventId,
        attempts: u32,
    },
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<EnrichmentTask>,
    tracked: HashSet<EventId>,
}

/// Shared handle; clones point at the same queue.
#[derive(Clone, Default)]
pub struct CoordinateQueue {
    state: Arc<Mutex<QueueState>>,
}

impl CoordinateQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a lookup for `event_id` unless one is already tracked or the
    /// record asked not to be rechecked yet.
    ///
    /// Returns `true` when a task was appended.
    pub async fn mark_stale_if_needed(
        &self,
        event_id: EventId,
        address: &str,
        recheck_after: DateTime<Utc>,
    ) -> bool {
        if recheck_after > Utc::now() {
            return false;
        }

        let mut state = self.state.lock().await;
        if !state.tracked.insert(event_id) {
            return false;
        }
        state.pending.push_back(EnrichmentTask {
            event_id,
            address: address.to_string(),
            attempts: 0,
        });
        debug!(event_id = %event_id, queued = state.pending.len(), "queued coordinate lookup");
        true
    }

    /// Queue a lookup for a freshly read or created record if it has no coordinates.
    pub async fn observe(&self, location: &EventLocation) -> bool {
        if !location.needs_coordinates() {
            return false;
        }
        self.mark_stale_if_needed(
            location.id,
            &location.address,
            location.coordinates_recheck_after,
        )
        .await
    }

    pub async fn is_tracked(&self, event_id: EventId) -> bool {
        self.state.lock().await.tracked.contains(&event_id)
    }

    pub async fn counts(&self) -> QueueCounts {
        let state = self.state.lock().await;
        QueueCounts {
            queued: state.pending.len(),
            tracked: state.tracked.len(),
        }
    }

    /// Take the head task, resolve it with the lock released and record the result.
    ///
    /// On success the coordinates are persisted and the ID stops being
    /// tracked. A failed lookup or a failed write puts the task back at the
    /// tail with the ID still tracked. Returns `None` when the queue is empty.
    pub async fn process_next(
        &self,
        resolver: &CoordinateResolver,
        events: &dyn BaseEventStore,
    ) -> Option<ProcessOutcome> {
        let task = self.state.lock().await.pending.pop_front()?;

        let coordinates = match resolver.resolve(&task.address, CallerTag::Refresh).await {
            Ok(coordinates) => coordinates,
            Err(e) => {
                error!(
                    event_id = %task.event_id,
                    address = %task.address,
                    error = %e,
                    "failed to resolve coordinates"
                );
                return Some(self.requeue(task).await);
            }
        };

        if let Err(e) = events.set_coordinates(task.event_id, coordinates).await {
            error!(
                event_id = %task.event_id,
                address = %task.address,
                error = %e,
                "failed to persist coordinates"
            );
            return Some(self.requeue(task).await);
        }

        self.state.lock().await.tracked.remove(&task.event_id);

        info!(
            event_id = %task.event_id,
            latitude = coordinates.latitude,
            longitude = coordinates.longitude,
            "set coordinates for event"
        );

        Some(ProcessOutcome::Resolved {
            event_id: task.event_id,
            coordinates,
        })
    }

    async fn requeue(&self, mut task: EnrichmentTask) -> ProcessOutcome {
        task.attempts += 1;
        let outcome = ProcessOutcome::Requeued {
            event_id: task.event_id,
            attempts: task.attempts,
        };
        self.state.lock().await.pending.push_back(task);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_double_mark_queues_once() {
        let queue = CoordinateQueue::new();
        let id = EventId::new();
        let now = Utc::now();

        assert!(queue.mark_stale_if_needed(id, "Addr1", now).await);
        assert!(!queue.mark_stale_if_needed(id, "Addr1", now).await);

        assert_eq!(queue.counts().await, QueueCounts { queued: 1, tracked: 1 });
    }

    #[tokio::test]
    async fn test_future_recheck_is_skipped() {
        let queue = CoordinateQueue::new();
        let later = Utc::now() + Duration::hours(1);

        assert!(!queue.mark_stale_if_needed(EventId::new(), "Addr1", later).await);
        assert_eq!(queue.counts().await, QueueCounts::default());
    }

    #[tokio::test]
    async fn test_observe_ignores_located_events() {
        let queue = CoordinateQueue::new();
        let located = EventLocation {
            id: EventId::new(),
            address: "Addr1".to_string(),
            latitude: Some(55.0),
            longitude: Some(37.0),
            coordinates_recheck_after: Utc::now() - Duration::minutes(1),
        };
        assert!(!queue.observe(&located).await);

        let missing = EventLocation {
            latitude: None,
            longitude: None,
            ..located
        };
        assert!(queue.observe(&missing).await);
        assert!(queue.is_tracked(missing.id).await);
    }

    #[tokio::test]
    async fn test_tasks_come_out_in_order() {
        let queue = CoordinateQueue::new();
        let now = Utc::now();
        let ids: Vec<EventId> = (0..3).map(|_| EventId::new()).collect();
        for id in &ids {
            queue.mark_stale_if_needed(*id, "Addr", now).await;
        }

        let state = queue.state.lock().await;
        let order: Vec<EventId> = state.pending.iter().map(|t| t.event_id).collect();
        assert_eq!(order, ids);
    }
}
