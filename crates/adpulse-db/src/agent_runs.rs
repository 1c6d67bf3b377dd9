//! Database operations for the `agent_runs` table.
//!
//! A run's status is monotonic: it is created as `running` and moves exactly
//! once to `completed` or `failed`. Both transition updates are guarded with
//! `WHERE status = 'running'` so a second terminal update is rejected with
//! [`DbError::InvalidRunTransition`] instead of silently rewriting history.

use adpulse_core::RunStatus;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `agent_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AgentRunRow {
    pub id: i64,
    pub public_id: Uuid,
    pub run_type: String,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub input_params: Value,
    pub output: Option<Value>,
    pub error_message: Option<String>,
}

const RUN_COLUMNS: &str = "id, public_id, run_type, status, started_at, completed_at, \
                           input_params, output, error_message";

// ---------------------------------------------------------------------------
// Lifecycle operations
// ---------------------------------------------------------------------------

/// Creates a new agent run in `running` status with `started_at = NOW()`
/// and the caller's input parameters captured verbatim.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_agent_run(
    pool: &PgPool,
    run_type: &str,
    input_params: &Value,
) -> Result<AgentRunRow, DbError> {
    let row = sqlx::query_as::<_, AgentRunRow>(&format!(
        "INSERT INTO agent_runs (run_type, status, input_params) \
         VALUES ($1, $2, $3) \
         RETURNING {RUN_COLUMNS}"
    ))
    .bind(run_type)
    .bind(RunStatus::Running.as_str())
    .bind(input_params)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Marks a run as `completed`, setting `completed_at = NOW()` and the
/// aggregated output document.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run is not currently
/// `running`, or [`DbError::Sqlx`] if the update fails.
pub async fn complete_agent_run(pool: &PgPool, id: i64, output: &Value) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE agent_runs \
         SET status = $1, completed_at = NOW(), output = $2 \
         WHERE id = $3 AND status = $4",
    )
    .bind(RunStatus::Completed.as_str())
    .bind(output)
    .bind(id)
    .bind(RunStatus::Running.as_str())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Marks a run as `failed`, setting `completed_at = NOW()` and the error
/// message. Rows persisted by stages that completed before the failure are
/// left untouched.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run is not currently
/// `running`, or [`DbError::Sqlx`] if the update fails.
pub async fn fail_agent_run(pool: &PgPool, id: i64, error_message: &str) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE agent_runs \
         SET status = $1, completed_at = NOW(), error_message = $2 \
         WHERE id = $3 AND status = $4",
    )
    .bind(RunStatus::Failed.as_str())
    .bind(error_message)
    .bind(id)
    .bind(RunStatus::Running.as_str())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Read operations
// ---------------------------------------------------------------------------

/// Fetches a single run by its internal `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_agent_run(pool: &PgPool, id: i64) -> Result<AgentRunRow, DbError> {
    let row = sqlx::query_as::<_, AgentRunRow>(&format!(
        "SELECT {RUN_COLUMNS} FROM agent_runs WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Fetches a single run by its public id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_agent_run_by_public_id(
    pool: &PgPool,
    public_id: Uuid,
) -> Result<Option<AgentRunRow>, DbError> {
    let row = sqlx::query_as::<_, AgentRunRow>(&format!(
        "SELECT {RUN_COLUMNS} FROM agent_runs WHERE public_id = $1"
    ))
    .bind(public_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns the most recent runs ordered by `started_at DESC`, optionally
/// filtered by status and run type.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_agent_runs(
    pool: &PgPool,
    status: Option<&str>,
    run_type: Option<&str>,
    limit: i64,
) -> Result<Vec<AgentRunRow>, DbError> {
    let rows = sqlx::query_as::<_, AgentRunRow>(&format!(
        "SELECT {RUN_COLUMNS} \
         FROM agent_runs \
         WHERE ($1::text IS NULL OR status = $1) \
           AND ($2::text IS NULL OR run_type = $2) \
         ORDER BY started_at DESC, id DESC \
         LIMIT $3"
    ))
    .bind(status)
    .bind(run_type)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
