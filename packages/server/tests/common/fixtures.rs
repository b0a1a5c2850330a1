//! Test fixtures for creating test data.
//!
//! Rows are inserted directly; the store adapters under test only read and
//! update them.

use anyhow::Result;
use sportify_core::common::{EventId, MemberId, PaymentId};
use sportify_core::domains::payments::{Payment, PaymentStatus};
use sqlx::PgPool;

/// Create an active event without coordinates
pub async fn create_test_event(pool: &PgPool, address: &str, capacity: Option<i32>) -> Result<EventId> {
    let id = EventId::new();
    sqlx::query(
        "INSERT INTO events (id, title, address, capacity, coordinates_recheck_after)
         VALUES ($1, 'Test game', $2, $3, NOW() - INTERVAL '1 minute')",
    )
    .bind(id)
    .bind(address)
    .bind(capacity)
    .execute(pool)
    .await?;
    Ok(id)
}

/// Mark an event as finished an hour ago
pub async fn end_test_event(pool: &PgPool, id: EventId) -> Result<()> {
    sqlx::query("UPDATE events SET ends_at = NOW() - INTERVAL '1 hour' WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Create a pending payment for an event
pub async fn create_test_payment(pool: &PgPool, event_id: EventId, user_id: MemberId) -> Result<PaymentId> {
    let payment = Payment {
        id: PaymentId::new(),
        event_id,
        user_id,
        status: PaymentStatus::Pending,
        amount: 50_000,
        confirmation_url: None,
    }
    .insert(pool)
    .await?;
    Ok(payment.id)
}
