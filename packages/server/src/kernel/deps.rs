//! Server dependencies for activities (using traits for testability)
//!
//! This module provides the central dependency container used by all domain
//! activities and background services. Storage and geocoding sit behind trait
//! objects so tests can swap in the in-memory versions.

use std::sync::Arc;
use std::time::Duration;

use crate::kernel::enrichment::CoordinateQueue;
use crate::kernel::{BaseEventStore, BasePaymentStore, CoordinateResolver, SettlementScheduler};

/// Server dependencies accessible to activities
#[derive(Clone)]
pub struct ServerDeps {
    pub events: Arc<dyn BaseEventStore>,
    pub payments: Arc<dyn BasePaymentStore>,
    pub resolver: CoordinateResolver,
    /// Shared with the enrichment workers
    pub coordinate_queue: CoordinateQueue,
    pub settlement: SettlementScheduler,
}

impl ServerDeps {
    /// Create new ServerDeps; the queue starts empty and the scheduler idle.
    pub fn new(
        events: Arc<dyn BaseEventStore>,
        payments: Arc<dyn BasePaymentStore>,
        resolver: CoordinateResolver,
        settlement_delay: Duration,
    ) -> Self {
        let settlement = SettlementScheduler::new(payments.clone(), events.clone(), settlement_delay);
        Self {
            events,
            payments,
            resolver,
            coordinate_queue: CoordinateQueue::new(),
            settlement,
        }
    }
}
