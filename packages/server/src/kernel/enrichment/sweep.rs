use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::CoordinateQueue;
use crate::kernel::service_host::Service;
use crate::kernel::BaseEventStore;

/// Queue every active event that is still missing coordinates.
///
/// Returns how many new tasks were queued.
pub async fn sweep_missing_coordinates(
    queue: &CoordinateQueue,
    events: &dyn BaseEventStore,
) -> Result<usize> {
    let missing = events.find_active_missing_coordinates().await?;

    let mut queued = 0;
    for location in &missing {
        if queue.observe(location).await {
            queued += 1;
        }
    }
    Ok(queued)
}

/// Periodic discovery of events without coordinates.
///
/// The first sweep runs as soon as the service starts.
pub struct CoordinateSweep {
    queue: CoordinateQueue,
    events: Arc<dyn BaseEventStore>,
    period: Duration,
}

impl CoordinateSweep {
    pub fn new(queue: CoordinateQueue, events: Arc<dyn BaseEventStore>, period: Duration) -> Self {
        Self {
            queue,
            events,
            period,
        }
    }
}

#[async_trait]
impl Service for CoordinateSweep {
    fn name(&self) -> &'static str {
        "coordinate-sweep"
    }

    async fn run(self: Box<Self>, shutdown: CancellationToken) -> Result<()> {
        info!(period_secs = self.period.as_secs(), "coordinate sweep starting");

        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match sweep_missing_coordinates(&self.queue, self.events.as_ref()).await {
                Ok(0) => {}
                Ok(queued) => debug!(queued, "sweep queued events without coordinates"),
                Err(e) => error!(error = %e, "failed to load events missing coordinates"),
            }
        }

        info!("coordinate sweep stopped");
        Ok(())
    }
}
