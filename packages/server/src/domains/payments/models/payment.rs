use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;

use crate::common::{EventId, MemberId, PaymentId};

/// Payment status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Cancelled,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Paid => write!(f, "paid"),
            PaymentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A user's payment for taking part in an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payment {
    pub id: PaymentId,
    pub event_id: EventId,
    pub user_id: MemberId,
    pub status: PaymentStatus,
    /// Minor currency units
    pub amount: i64,
    pub confirmation_url: Option<String>,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Payment {
    pub async fn find_by_id(id: PaymentId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT id, event_id, user_id, status, amount, confirmation_url
             FROM payments
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn insert(&self, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO payments (id, event_id, user_id, status, amount, confirmation_url)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id, event_id, user_id, status, amount, confirmation_url",
        )
        .bind(self.id)
        .bind(self.event_id)
        .bind(self.user_id)
        .bind(self.status)
        .bind(self.amount)
        .bind(&self.confirmation_url)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn update_status(id: PaymentId, status: PaymentStatus, pool: &PgPool) -> Result<()> {
        sqlx::query("UPDATE payments SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        assert_eq!(PaymentStatus::Cancelled.to_string(), "cancelled");
        assert_eq!(serde_json::to_string(&PaymentStatus::Paid).unwrap(), "\"paid\"");
        let parsed: PaymentStatus = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(parsed, PaymentStatus::Pending);
    }
}
