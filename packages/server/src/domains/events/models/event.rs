use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::utils::Coordinates;
use crate::common::{EventId, MemberId};

/// The slice of an event row the coordinate refresh works with.
///
/// Read-only from the point of view of the refresh: only the coordinates are
/// ever written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventLocation {
    pub id: EventId,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Coordinates are not looked up again before this instant
    pub coordinates_recheck_after: DateTime<Utc>,
}

impl EventLocation {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }

    pub fn needs_coordinates(&self) -> bool {
        self.coordinates().is_none()
    }
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl EventLocation {
    pub async fn find_by_id(id: EventId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT id, address, latitude, longitude, coordinates_recheck_after
             FROM events
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Events that are neither deleted nor finished and still have no coordinates
    pub async fn find_active_missing_coordinates(pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT id, address, latitude, longitude, coordinates_recheck_after
             FROM events
             WHERE deleted_at IS NULL
               AND (ends_at IS NULL OR ends_at > NOW())
               AND (latitude IS NULL OR longitude IS NULL)
             ORDER BY created_at ASC",
        )
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn set_coordinates(
        id: EventId,
        coordinates: Coordinates,
        pool: &PgPool,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE events
             SET latitude = $2, longitude = $3, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(coordinates.latitude)
        .bind(coordinates.longitude)
        .execute(pool)
        .await?;
        Ok(())
    }
}

/// Append a user to the event's paid list unless already there.
pub async fn add_paid_user(event_id: EventId, user_id: MemberId, pool: &PgPool) -> Result<()> {
    sqlx::query(
        "UPDATE events
         SET paid_user_ids = ARRAY_APPEND(paid_user_ids, $2), updated_at = NOW()
         WHERE id = $1 AND NOT ($2 = ANY(paid_user_ids))",
    )
    .bind(event_id)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(())
}
