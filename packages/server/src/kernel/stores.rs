//! Postgres-backed store adapters.
//!
//! Thin wrappers delegating to the model queries; the SQL itself lives in
//! `domains::*::models`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;

use crate::common::utils::Coordinates;
use crate::common::{EventId, MemberId, PaymentId};
use crate::domains::events::models::{event, EventLocation, Membership};
use crate::domains::payments::models::{Payment, PaymentStatus};
use crate::kernel::{BaseEventStore, BasePaymentStore};

#[derive(Clone)]
pub struct PostgresEventStore {
    pool: PgPool,
}

impl PostgresEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseEventStore for PostgresEventStore {
    async fn find_active_missing_coordinates(&self) -> Result<Vec<EventLocation>> {
        EventLocation::find_active_missing_coordinates(&self.pool)
            .await
            .context("Failed to load events missing coordinates")
    }

    async fn set_coordinates(&self, event_id: EventId, coordinates: Coordinates) -> Result<()> {
        EventLocation::set_coordinates(event_id, coordinates, &self.pool)
            .await
            .with_context(|| format!("Failed to set coordinates for event {}", event_id))
    }

    async fn find_location(&self, event_id: EventId) -> Result<Option<EventLocation>> {
        EventLocation::find_by_id(event_id, &self.pool)
            .await
            .with_context(|| format!("Failed to load event {}", event_id))
    }

    async fn load_membership(&self, event_id: EventId) -> Result<Option<Membership>> {
        Membership::find_by_event(event_id, &self.pool)
            .await
            .with_context(|| format!("Failed to load membership of event {}", event_id))
    }

    async fn persist_membership(&self, membership: &Membership) -> Result<bool> {
        membership
            .compare_and_swap(&self.pool)
            .await
            .with_context(|| format!("Failed to persist membership of event {}", membership.event_id))
    }

    async fn add_paid_user(&self, event_id: EventId, user_id: MemberId) -> Result<()> {
        event::add_paid_user(event_id, user_id, &self.pool)
            .await
            .with_context(|| format!("Failed to add paid user to event {}", event_id))
    }
}

#[derive(Clone)]
pub struct PostgresPaymentStore {
    pool: PgPool,
}

impl PostgresPaymentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BasePaymentStore for PostgresPaymentStore {
    async fn find_payment(&self, payment_id: PaymentId) -> Result<Option<Payment>> {
        Payment::find_by_id(payment_id, &self.pool)
            .await
            .with_context(|| format!("Failed to load payment {}", payment_id))
    }

    async fn update_status(&self, payment_id: PaymentId, status: PaymentStatus) -> Result<()> {
        Payment::update_status(payment_id, status, &self.pool)
            .await
            .with_context(|| format!("Failed to set payment {} to {}", payment_id, status))
    }
}
