//! Database operations for the `creatives` table.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `creatives` table.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CreativeRow {
    pub id: i64,
    pub agent_run_id: i64,
    pub action_id: Option<i64>,
    pub platform: String,
    pub creative_type: String,
    pub headline: String,
    pub primary_text: String,
    pub description: String,
    pub call_to_action: String,
    pub status: String,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Field set for inserting a new creative.
pub struct NewCreative<'a> {
    pub agent_run_id: i64,
    pub action_id: Option<i64>,
    pub platform: &'a str,
    pub creative_type: &'a str,
    pub headline: &'a str,
    pub primary_text: &'a str,
    pub description: &'a str,
    pub call_to_action: &'a str,
}

/// Inserts a creative row (status `draft`) and returns it.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_creative<'e, E>(
    executor: E,
    creative: &NewCreative<'_>,
) -> Result<CreativeRow, DbError>
where
    E: sqlx::PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, CreativeRow>(
        "INSERT INTO creatives \
             (agent_run_id, action_id, platform, creative_type, headline, \
              primary_text, description, call_to_action) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING id, agent_run_id, action_id, platform, creative_type, headline, \
                   primary_text, description, call_to_action, status, \
                   approved_by, approved_at, created_at",
    )
    .bind(creative.agent_run_id)
    .bind(creative.action_id)
    .bind(creative.platform)
    .bind(creative.creative_type)
    .bind(creative.headline)
    .bind(creative.primary_text)
    .bind(creative.description)
    .bind(creative.call_to_action)
    .fetch_one(executor)
    .await?;

    Ok(row)
}

/// Returns all creatives recorded for a run, in insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_creatives_for_run(
    pool: &PgPool,
    run_id: i64,
) -> Result<Vec<CreativeRow>, DbError> {
    let rows = sqlx::query_as::<_, CreativeRow>(
        "SELECT id, agent_run_id, action_id, platform, creative_type, headline, \
                primary_text, description, call_to_action, status, \
                approved_by, approved_at, created_at \
         FROM creatives \
         WHERE agent_run_id = $1 \
         ORDER BY id",
    )
    .bind(run_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
