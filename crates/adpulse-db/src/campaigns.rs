//! Database operations for the `campaigns` table.

use adpulse_core::CanonicalMetric;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `campaigns` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CampaignRow {
    pub id: i64,
    pub public_id: Uuid,
    pub external_id: String,
    pub name: String,
    pub source: String,
    pub status: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Upserts a campaign keyed by its natural key `(external_id, source)`.
///
/// On conflict only `name`, `status`, and `updated_at` are replaced;
/// `id`, `public_id`, `external_id`, and `source` are immutable after
/// creation. Returns the full resolved row, so repeat ingestion of the same
/// key always yields the same `id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_campaign<'e, E>(
    executor: E,
    metric: &CanonicalMetric,
) -> Result<CampaignRow, DbError>
where
    E: sqlx::PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, CampaignRow>(
        "INSERT INTO campaigns (external_id, name, source, status) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (external_id, source) DO UPDATE SET \
             name       = EXCLUDED.name, \
             status     = EXCLUDED.status, \
             updated_at = NOW() \
         RETURNING id, public_id, external_id, name, source, status, created_at, updated_at",
    )
    .bind(&metric.external_id)
    .bind(&metric.campaign_name)
    .bind(&metric.source)
    .bind(&metric.status)
    .fetch_one(executor)
    .await?;

    Ok(row)
}

/// Returns a single campaign by its public id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_campaign_by_public_id(
    pool: &PgPool,
    public_id: Uuid,
) -> Result<Option<CampaignRow>, DbError> {
    let row = sqlx::query_as::<_, CampaignRow>(
        "SELECT id, public_id, external_id, name, source, status, created_at, updated_at \
         FROM campaigns \
         WHERE public_id = $1",
    )
    .bind(public_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns campaigns ordered by name, optionally filtered by source and status.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_campaigns(
    pool: &PgPool,
    source: Option<&str>,
    status: Option<&str>,
    limit: i64,
) -> Result<Vec<CampaignRow>, DbError> {
    let rows = sqlx::query_as::<_, CampaignRow>(
        "SELECT id, public_id, external_id, name, source, status, created_at, updated_at \
         FROM campaigns \
         WHERE ($1::text IS NULL OR source = $1) \
           AND ($2::text IS NULL OR status = $2) \
         ORDER BY name, id \
         LIMIT $3",
    )
    .bind(source)
    .bind(status)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
