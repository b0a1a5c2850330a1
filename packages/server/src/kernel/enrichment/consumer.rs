use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::CoordinateQueue;
use crate::kernel::service_host::Service;
use crate::kernel::{BaseEventStore, CoordinateResolver};

/// Works through the coordinate queue, one task per tick.
pub struct CoordinateConsumer {
    queue: CoordinateQueue,
    resolver: CoordinateResolver,
    events: Arc<dyn BaseEventStore>,
    interval: Duration,
}

impl CoordinateConsumer {
    pub fn new(
        queue: CoordinateQueue,
        resolver: CoordinateResolver,
        events: Arc<dyn BaseEventStore>,
        interval: Duration,
    ) -> Self {
        Self {
            queue,
            resolver,
            events,
            interval,
        }
    }
}

#[async_trait]
impl Service for CoordinateConsumer {
    fn name(&self) -> &'static str {
        "coordinate-consumer"
    }

    async fn run(self: Box<Self>, shutdown: CancellationToken) -> Result<()> {
        info!(interval_ms = self.interval.as_millis() as u64, "coordinate consumer starting");

        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            // Not raced against shutdown: a lookup in flight finishes first
            self.queue
                .process_next(&self.resolver, self.events.as_ref())
                .await;
        }

        info!("coordinate consumer stopped");
        Ok(())
    }
}
