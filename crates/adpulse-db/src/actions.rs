//! Database operations for the `actions` table.
//!
//! Actions are inserted by the decision stage with status `pending`; the
//! approval workflow that later mutates `status`/`approved_by` lives outside
//! this pipeline.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `actions` table.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ActionRow {
    pub id: i64,
    pub agent_run_id: i64,
    pub action_type: String,
    pub campaign_id: Option<i64>,
    pub description: String,
    pub priority: String,
    pub status: String,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Field set for inserting a new action.
pub struct NewAction<'a> {
    pub agent_run_id: i64,
    pub action_type: &'a str,
    pub campaign_id: Option<i64>,
    pub description: &'a str,
    pub priority: &'a str,
}

/// Inserts an action row (status `pending`) and returns it.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_action<'e, E>(executor: E, action: &NewAction<'_>) -> Result<ActionRow, DbError>
where
    E: sqlx::PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, ActionRow>(
        "INSERT INTO actions (agent_run_id, action_type, campaign_id, description, priority) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id, agent_run_id, action_type, campaign_id, description, priority, \
                   status, approved_by, approved_at, created_at",
    )
    .bind(action.agent_run_id)
    .bind(action.action_type)
    .bind(action.campaign_id)
    .bind(action.description)
    .bind(action.priority)
    .fetch_one(executor)
    .await?;

    Ok(row)
}

/// Returns all actions recorded for a run, in insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_actions_for_run(pool: &PgPool, run_id: i64) -> Result<Vec<ActionRow>, DbError> {
    let rows = sqlx::query_as::<_, ActionRow>(
        "SELECT id, agent_run_id, action_type, campaign_id, description, priority, \
                status, approved_by, approved_at, created_at \
         FROM actions \
         WHERE agent_run_id = $1 \
         ORDER BY id",
    )
    .bind(run_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
