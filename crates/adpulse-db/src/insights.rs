//! Database operations for the `insights` table.
//!
//! Insights are append-only within a run: they are inserted by the analysis
//! stage and never updated afterwards.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `insights` table.
///
/// Serializable so that a run's full insight list can be embedded in the
/// aggregated report document.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct InsightRow {
    pub id: i64,
    pub agent_run_id: i64,
    pub insight_type: String,
    pub campaign_id: i64,
    pub metric: String,
    pub change_percent: Option<Decimal>,
    pub description: String,
    pub severity: String,
    pub created_at: DateTime<Utc>,
}

/// Field set for inserting a new insight.
pub struct NewInsight<'a> {
    pub agent_run_id: i64,
    pub insight_type: &'a str,
    pub campaign_id: i64,
    pub metric: &'a str,
    pub change_percent: Option<Decimal>,
    pub description: &'a str,
    pub severity: &'a str,
}

/// Inserts an insight row and returns it.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_insight<'e, E>(
    executor: E,
    insight: &NewInsight<'_>,
) -> Result<InsightRow, DbError>
where
    E: sqlx::PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, InsightRow>(
        "INSERT INTO insights \
             (agent_run_id, insight_type, campaign_id, metric, change_percent, \
              description, severity) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING id, agent_run_id, insight_type, campaign_id, metric, \
                   change_percent, description, severity, created_at",
    )
    .bind(insight.agent_run_id)
    .bind(insight.insight_type)
    .bind(insight.campaign_id)
    .bind(insight.metric)
    .bind(insight.change_percent)
    .bind(insight.description)
    .bind(insight.severity)
    .fetch_one(executor)
    .await?;

    Ok(row)
}

/// Returns all insights recorded for a run, in insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_insights_for_run(pool: &PgPool, run_id: i64) -> Result<Vec<InsightRow>, DbError> {
    let rows = sqlx::query_as::<_, InsightRow>(
        "SELECT id, agent_run_id, insight_type, campaign_id, metric, \
                change_percent, description, severity, created_at \
         FROM insights \
         WHERE agent_run_id = $1 \
         ORDER BY id",
    )
    .bind(run_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
