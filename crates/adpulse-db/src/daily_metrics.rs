//! Database operations for the `daily_metrics` table, including the
//! windowed per-campaign aggregation used by the analysis pipeline.

use adpulse_core::CanonicalMetric;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `daily_metrics` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DailyMetricRow {
    pub id: i64,
    pub date: NaiveDate,
    pub campaign_id: i64,
    pub source: String,
    pub impressions: i64,
    pub clicks: i64,
    pub spend: Decimal,
    pub conversions: i64,
    pub revenue: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Per-campaign metric totals over a date window, as summed by
/// [`aggregate_window`]. Raw sums only; derived ratios are computed by the
/// analysis pipeline.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CampaignWindowRow {
    pub campaign_id: i64,
    pub impressions: i64,
    pub clicks: i64,
    pub spend: Decimal,
    pub conversions: i64,
    pub revenue: Decimal,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Upserts a daily metric keyed by `(date, campaign_id, source)`.
///
/// On conflict all five numeric fields are overwritten from the incoming
/// record: full replace, last-write-wins, no accumulation across repeated
/// ingestion of the same key.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_daily_metric<'e, E>(
    executor: E,
    metric: &CanonicalMetric,
    campaign_id: i64,
) -> Result<DailyMetricRow, DbError>
where
    E: sqlx::PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, DailyMetricRow>(
        "INSERT INTO daily_metrics \
             (date, campaign_id, source, impressions, clicks, spend, conversions, revenue) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         ON CONFLICT (date, campaign_id, source) DO UPDATE SET \
             impressions = EXCLUDED.impressions, \
             clicks      = EXCLUDED.clicks, \
             spend       = EXCLUDED.spend, \
             conversions = EXCLUDED.conversions, \
             revenue     = EXCLUDED.revenue \
         RETURNING id, date, campaign_id, source, impressions, clicks, spend, \
                   conversions, revenue, created_at",
    )
    .bind(metric.date)
    .bind(campaign_id)
    .bind(&metric.source)
    .bind(metric.impressions)
    .bind(metric.clicks)
    .bind(metric.spend)
    .bind(metric.conversions)
    .bind(metric.revenue)
    .fetch_one(executor)
    .await?;

    Ok(row)
}

/// A daily metric row joined with its campaign's public identity, as served
/// by the read API.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DailyMetricWithCampaign {
    pub id: i64,
    pub date: NaiveDate,
    pub campaign_id: uuid::Uuid,
    pub campaign_name: String,
    pub source: String,
    pub impressions: i64,
    pub clicks: i64,
    pub spend: Decimal,
    pub conversions: i64,
    pub revenue: Decimal,
}

/// Returns daily metric rows (with campaign identity) ordered by date
/// descending, with optional campaign/date-range/source filters.
///
/// `start_date` is inclusive and `end_date` exclusive, matching the
/// aggregation window convention.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_daily_metrics(
    pool: &PgPool,
    campaign_public_id: Option<uuid::Uuid>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    source: Option<&str>,
    limit: i64,
) -> Result<Vec<DailyMetricWithCampaign>, DbError> {
    let rows = sqlx::query_as::<_, DailyMetricWithCampaign>(
        "SELECT m.id, m.date, c.public_id AS campaign_id, c.name AS campaign_name, \
                m.source, m.impressions, m.clicks, m.spend, m.conversions, m.revenue \
         FROM daily_metrics m \
         JOIN campaigns c ON c.id = m.campaign_id \
         WHERE ($1::uuid IS NULL OR c.public_id = $1) \
           AND ($2::date IS NULL OR m.date >= $2) \
           AND ($3::date IS NULL OR m.date < $3) \
           AND ($4::text IS NULL OR m.source = $4) \
         ORDER BY m.date DESC, m.id DESC \
         LIMIT $5",
    )
    .bind(campaign_public_id)
    .bind(start_date)
    .bind(end_date)
    .bind(source)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Sums metrics per campaign over the half-open window `[start, end)`,
/// across all sources. Campaigns with no rows in the window are absent from
/// the result.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn aggregate_window(
    pool: &PgPool,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<CampaignWindowRow>, DbError> {
    let rows = sqlx::query_as::<_, CampaignWindowRow>(
        "SELECT campaign_id, \
                SUM(impressions)::BIGINT AS impressions, \
                SUM(clicks)::BIGINT      AS clicks, \
                SUM(spend)               AS spend, \
                SUM(conversions)::BIGINT AS conversions, \
                SUM(revenue)             AS revenue \
         FROM daily_metrics \
         WHERE date >= $1 AND date < $2 \
         GROUP BY campaign_id",
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
