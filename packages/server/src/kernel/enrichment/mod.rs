//! Background coordinate enrichment for event addresses.
//!
//! ```text
//! CoordinateSweep (every 60s)           reads / creates
//!     │                                      │
//!     └─► find_active_missing_coordinates    └─► CoordinateQueue::observe
//!             └─► CoordinateQueue ◄──────────────┘
//!                     │
//! CoordinateConsumer (every 1.5s)
//!     └─► process_next ─► CoordinateResolver ─► set_coordinates
//!             └─► failure: back to the tail
//! ```

mod consumer;
mod queue;
mod sweep;

use std::time::Duration;

use tokio_util::sync::CancellationToken;

pub use consumer::CoordinateConsumer;
pub use queue::{CoordinateQueue, EnrichmentTask, ProcessOutcome, QueueCounts};
pub use sweep::{sweep_missing_coordinates, CoordinateSweep};

use crate::kernel::service_host::{RunningServices, ServiceHost};
use crate::kernel::ServerDeps;

/// Timing of the two enrichment loops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSettings {
    pub sweep_period: Duration,
    pub consumer_interval: Duration,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            sweep_period: Duration::from_secs(60),
            consumer_interval: Duration::from_millis(1500),
        }
    }
}

/// Start the sweep and the consumer for `queue`.
///
/// Both stop at their next tick once `shutdown` is cancelled; join the
/// returned handle to wait for them.
pub fn start_background_workers(
    queue: CoordinateQueue,
    deps: &ServerDeps,
    shutdown: CancellationToken,
    settings: RefreshSettings,
) -> RunningServices {
    ServiceHost::new()
        .with_service(CoordinateSweep::new(
            queue.clone(),
            deps.events.clone(),
            settings.sweep_period,
        ))
        .with_service(CoordinateConsumer::new(
            queue,
            deps.resolver.clone(),
            deps.events.clone(),
            settings.consumer_interval,
        ))
        .start(shutdown)
}
