//! Single-record and batch ingestion flows.

use adpulse_core::normalize_metric;
use adpulse_db::{upsert_campaign, upsert_daily_metric, DbError};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::IngestError;

/// Identifiers of the campaign and metric affected by a successful ingest.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReceipt {
    pub campaign_id: i64,
    pub campaign_public_id: Uuid,
    pub campaign_name: String,
    pub metric_id: i64,
    pub date: NaiveDate,
}

/// Summary of a batch ingest: per-record successes, failures, and the
/// failures' offending payloads.
#[derive(Debug, Default, Serialize)]
pub struct BatchOutcome {
    pub success: usize,
    pub failed: usize,
    pub errors: Vec<BatchError>,
}

/// One failed record within a batch: the raw payload as submitted plus the
/// failure message.
#[derive(Debug, Serialize)]
pub struct BatchError {
    pub data: Value,
    pub error: String,
}

/// Ingests a single raw metric record.
///
/// Normalizes the record, then upserts the campaign and the daily metric in
/// one transaction. On any failure the transaction is rolled back and the
/// error propagates; a partially-written record is never left behind.
///
/// # Errors
///
/// Returns [`IngestError::Validation`] when the record fails normalization,
/// or [`IngestError::Db`] when a storage operation fails.
pub async fn ingest_metric(
    pool: &PgPool,
    raw: &Value,
    source: &str,
) -> Result<IngestReceipt, IngestError> {
    let canonical = normalize_metric(raw, source)?;

    let mut tx = pool.begin().await.map_err(DbError::from)?;
    let campaign = upsert_campaign(&mut *tx, &canonical).await?;
    let metric = upsert_daily_metric(&mut *tx, &canonical, campaign.id).await?;
    tx.commit().await.map_err(DbError::from)?;

    tracing::info!(
        campaign = %campaign.name,
        campaign_id = campaign.id,
        date = %metric.date,
        source,
        "ingested daily metric"
    );

    Ok(IngestReceipt {
        campaign_id: campaign.id,
        campaign_public_id: campaign.public_id,
        campaign_name: campaign.name,
        metric_id: metric.id,
        date: metric.date,
    })
}

/// Ingests a batch of raw records, strictly in input order.
///
/// Each record goes through [`ingest_metric`] in isolation: a failure is
/// caught, recorded with the offending payload, and does not affect prior or
/// subsequent records. Per-record failures are returned in the outcome's
/// error list; the batch call itself always succeeds.
pub async fn ingest_batch(pool: &PgPool, raw_records: &[Value], source: &str) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();

    for raw in raw_records {
        match ingest_metric(pool, raw, source).await {
            Ok(_) => outcome.success += 1,
            Err(e) => {
                tracing::error!(error = %e, source, "failed to ingest metric");
                outcome.failed += 1;
                outcome.errors.push(BatchError {
                    data: raw.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    outcome
}
