//! Derived-rate computation over windowed metric totals.

use std::collections::BTreeMap;

use adpulse_db::{aggregate_window, CampaignWindowRow, DbError};
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use sqlx::PgPool;

/// Per-campaign totals for one window plus the derived ratios used by the
/// period comparator. Every division by zero is defined as `0.0`, never an
/// error: a window with no spend has `roas = 0`, no impressions has
/// `ctr = 0`, no clicks has `cpc = 0` and `conversion_rate = 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowAggregate {
    pub campaign_id: i64,
    pub impressions: i64,
    pub clicks: i64,
    pub spend: f64,
    pub conversions: i64,
    pub revenue: f64,
    pub roas: f64,
    pub ctr: f64,
    pub cpc: f64,
    pub conversion_rate: f64,
}

/// Computes the derived ratios for one campaign's window totals.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn derive_rates(row: &CampaignWindowRow) -> WindowAggregate {
    let spend = row.spend.to_f64().unwrap_or(0.0);
    let revenue = row.revenue.to_f64().unwrap_or(0.0);
    let impressions = row.impressions as f64;
    let clicks = row.clicks as f64;
    let conversions = row.conversions as f64;

    WindowAggregate {
        campaign_id: row.campaign_id,
        impressions: row.impressions,
        clicks: row.clicks,
        spend,
        conversions: row.conversions,
        revenue,
        roas: if spend > 0.0 { revenue / spend } else { 0.0 },
        ctr: if impressions > 0.0 {
            clicks / impressions * 100.0
        } else {
            0.0
        },
        cpc: if clicks > 0.0 { spend / clicks } else { 0.0 },
        conversion_rate: if clicks > 0.0 {
            conversions / clicks * 100.0
        } else {
            0.0
        },
    }
}

/// Returns the value of a compared metric by name. Unknown names yield `0.0`;
/// the comparator only asks for members of
/// [`adpulse_core::COMPARED_METRICS`].
#[must_use]
pub fn metric_value(aggregate: &WindowAggregate, metric: &str) -> f64 {
    match metric {
        "roas" => aggregate.roas,
        "ctr" => aggregate.ctr,
        "cpc" => aggregate.cpc,
        "conversion_rate" => aggregate.conversion_rate,
        "revenue" => aggregate.revenue,
        _ => 0.0,
    }
}

/// Aggregates the half-open window `[start, end)` and derives rates,
/// keyed by campaign id.
///
/// # Errors
///
/// Returns [`DbError`] if the aggregation query fails.
pub async fn aggregated_window_map(
    pool: &PgPool,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<BTreeMap<i64, WindowAggregate>, DbError> {
    let rows = aggregate_window(pool, start, end).await?;
    Ok(rows
        .iter()
        .map(|row| (row.campaign_id, derive_rates(row)))
        .collect())
}
