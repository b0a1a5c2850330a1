//! Delayed, at-most-once settlement of payments.
//!
//! The first status query for a payment schedules one delayed task that marks
//! the payment paid and records the user as paid for the event. Later queries
//! for the same payment do nothing, for as long as the scheduler lives.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::common::PaymentId;
use crate::domains::payments::models::PaymentStatus;
use crate::kernel::{BaseEventStore, BasePaymentStore};

pub const DEFAULT_SETTLEMENT_DELAY: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownMode {
    /// Wait for every scheduled settlement to run
    Drain,
    /// Drop settlements still waiting out their delay
    Abandon,
}

struct SchedulerInner {
    scheduled: Mutex<HashSet<PaymentId>>,
    tasks: TaskTracker,
    abandon: CancellationToken,
    delay: Duration,
    payments: Arc<dyn BasePaymentStore>,
    events: Arc<dyn BaseEventStore>,
}

/// Shared handle; clones point at the same scheduled set.
#[derive(Clone)]
pub struct SettlementScheduler {
    inner: Arc<SchedulerInner>,
}

impl SettlementScheduler {
    pub fn new(
        payments: Arc<dyn BasePaymentStore>,
        events: Arc<dyn BaseEventStore>,
        delay: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                scheduled: Mutex::new(HashSet::new()),
                tasks: TaskTracker::new(),
                abandon: CancellationToken::new(),
                delay,
                payments,
                events,
            }),
        }
    }

    /// Schedule settlement of `payment_id` unless it was scheduled before.
    ///
    /// Returns `true` when this call submitted the delayed task. Once shutdown
    /// has begun the ID is still recorded but nothing is submitted.
    pub async fn on_payment_status_queried(&self, payment_id: PaymentId) -> bool {
        if !self.inner.scheduled.lock().await.insert(payment_id) {
            return false;
        }

        if self.inner.tasks.is_closed() {
            warn!(payment_id = %payment_id, "scheduler is shutting down, settlement not scheduled");
            return false;
        }

        let inner = self.inner.clone();
        self.inner.tasks.spawn(async move {
            tokio::select! {
                _ = inner.abandon.cancelled() => {
                    info!(payment_id = %payment_id, "settlement abandoned");
                    return;
                }
                _ = tokio::time::sleep(inner.delay) => {}
            }

            match settle(&inner, payment_id).await {
                Ok(()) => info!(payment_id = %payment_id, "payment settled"),
                Err(e) => error!(payment_id = %payment_id, error = %e, "settlement failed"),
            }
        });

        debug!(payment_id = %payment_id, delay_secs = self.inner.delay.as_secs(), "settlement scheduled");
        true
    }

    pub async fn is_scheduled(&self, payment_id: PaymentId) -> bool {
        self.inner.scheduled.lock().await.contains(&payment_id)
    }

    pub async fn scheduled_count(&self) -> usize {
        self.inner.scheduled.lock().await.len()
    }

    /// Settlement tasks that have not finished yet
    pub fn in_flight(&self) -> usize {
        self.inner.tasks.len()
    }

    /// Stop accepting work and wait for the tracked tasks to finish.
    pub async fn shutdown(&self, mode: ShutdownMode) {
        self.inner.tasks.close();
        if mode == ShutdownMode::Abandon {
            self.inner.abandon.cancel();
        }

        info!(mode = ?mode, in_flight = self.in_flight(), "waiting for settlements");
        self.inner.tasks.wait().await;
    }
}

async fn settle(inner: &SchedulerInner, payment_id: PaymentId) -> Result<()> {
    inner
        .payments
        .update_status(payment_id, PaymentStatus::Paid)
        .await
        .context("Failed to mark payment paid")?;

    let payment = inner
        .payments
        .find_payment(payment_id)
        .await
        .context("Failed to reload payment")?
        .ok_or_else(|| anyhow!("payment {} disappeared before settlement", payment_id))?;

    inner
        .events
        .add_paid_user(payment.event_id, payment.user_id)
        .await
        .context("Failed to record paid user")?;

    Ok(())
}
