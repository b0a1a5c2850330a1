//! Payment status query

use anyhow::Result;
use tracing::debug;

use crate::common::PaymentId;
use crate::domains::payments::models::PaymentStatus;
use crate::kernel::ServerDeps;

/// Current status of a payment, or `None` if it does not exist.
///
/// Asking about a pending payment schedules its settlement (once).
pub async fn get_payment_status(
    payment_id: PaymentId,
    deps: &ServerDeps,
) -> Result<Option<PaymentStatus>> {
    let Some(payment) = deps.payments.find_payment(payment_id).await? else {
        return Ok(None);
    };

    if payment.status == PaymentStatus::Pending
        && deps.settlement.on_payment_status_queried(payment_id).await
    {
        debug!(payment_id = %payment_id, "first status query, settlement scheduled");
    }

    Ok(Some(payment.status))
}
