//! Stage 1: period comparison.
//!
//! Aggregates the current and previous windows, diffs each campaign's
//! derived metrics, classifies qualifying changes into insights, and
//! persists them against the run.

use std::collections::BTreeMap;

use adpulse_core::{
    AnalysisThresholds, InsightType, Severity, COMPARED_METRICS, METRIC_NEW_CAMPAIGN,
};
use adpulse_db::{insert_insight, DbError, InsightRow, NewInsight};
use chrono::{Days, NaiveDate};
use rust_decimal::{prelude::FromPrimitive, Decimal};
use sqlx::PgPool;

use crate::window::{aggregated_window_map, metric_value, WindowAggregate};
use crate::PipelineError;

const NEW_CAMPAIGN_DESCRIPTION: &str = "New campaign detected";

/// A classified metric change before persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct InsightDraft {
    pub campaign_id: i64,
    pub insight_type: InsightType,
    pub metric: &'static str,
    pub change_percent: Option<f64>,
    pub description: String,
    pub severity: Severity,
}

/// Classifies a percent change against the thresholds.
///
/// Returns `None` inside the dead band (boundaries inclusive: exactly -20.00
/// or +20.00 is not an insight). Severity escalates strictly beyond the
/// severe/strong thresholds.
#[must_use]
pub fn classify_change(
    change_percent: f64,
    thresholds: &AnalysisThresholds,
) -> Option<(InsightType, Severity)> {
    if change_percent < thresholds.drop_pct {
        let severity = if change_percent < thresholds.severe_drop_pct {
            Severity::High
        } else {
            Severity::Medium
        };
        Some((InsightType::Drop, severity))
    } else if change_percent > thresholds.opportunity_pct {
        let severity = if change_percent > thresholds.strong_opportunity_pct {
            Severity::High
        } else {
            Severity::Medium
        };
        Some((InsightType::Opportunity, severity))
    } else {
        None
    }
}

/// Diffs two adjacent windows and emits insight drafts.
///
/// Campaigns present in the current window but absent from the previous one
/// produce a single new-campaign opportunity and are not otherwise compared.
/// A metric whose previous value is zero is skipped; the percent change
/// would be undefined.
#[must_use]
pub fn compare_windows(
    current: &BTreeMap<i64, WindowAggregate>,
    previous: &BTreeMap<i64, WindowAggregate>,
    thresholds: &AnalysisThresholds,
) -> Vec<InsightDraft> {
    let mut drafts = Vec::new();

    for (campaign_id, current_agg) in current {
        let Some(previous_agg) = previous.get(campaign_id) else {
            drafts.push(InsightDraft {
                campaign_id: *campaign_id,
                insight_type: InsightType::Opportunity,
                metric: METRIC_NEW_CAMPAIGN,
                change_percent: None,
                description: NEW_CAMPAIGN_DESCRIPTION.to_string(),
                severity: Severity::Medium,
            });
            continue;
        };

        for metric in COMPARED_METRICS {
            let current_val = metric_value(current_agg, metric);
            let previous_val = metric_value(previous_agg, metric);

            if previous_val == 0.0 {
                continue;
            }

            let change_percent = (current_val - previous_val) / previous_val * 100.0;
            let Some((insight_type, severity)) = classify_change(change_percent, thresholds)
            else {
                continue;
            };

            let description = match insight_type {
                InsightType::Drop => format!(
                    "{} dropped {:.1}%",
                    metric.to_uppercase(),
                    change_percent.abs()
                ),
                InsightType::Opportunity => {
                    format!("{} increased {change_percent:.1}%", metric.to_uppercase())
                }
            };

            drafts.push(InsightDraft {
                campaign_id: *campaign_id,
                insight_type,
                metric,
                change_percent: Some(change_percent),
                description,
                severity,
            });
        }
    }

    drafts
}

/// Runs the analysis stage for one run.
///
/// Current window is `[end_date - comparison_days, end_date)` and the
/// previous window the adjacent range before it. All emitted insights are
/// persisted in one stage transaction, associated with `run_id`.
///
/// # Errors
///
/// Returns [`PipelineError::Db`] if aggregation or persistence fails.
pub async fn analyze(
    pool: &PgPool,
    thresholds: &AnalysisThresholds,
    run_id: i64,
    end_date: NaiveDate,
    comparison_days: i64,
) -> Result<Vec<InsightRow>, PipelineError> {
    let days = Days::new(comparison_days.max(0).unsigned_abs());
    let current_start = end_date.checked_sub_days(days).unwrap_or(end_date);
    let previous_start = current_start.checked_sub_days(days).unwrap_or(current_start);

    let current = aggregated_window_map(pool, current_start, end_date).await?;
    let previous = aggregated_window_map(pool, previous_start, current_start).await?;

    let drafts = compare_windows(&current, &previous, thresholds);

    let mut tx = pool.begin().await.map_err(DbError::from)?;
    let mut rows = Vec::with_capacity(drafts.len());
    for draft in &drafts {
        let change_percent = draft
            .change_percent
            .and_then(Decimal::from_f64)
            .map(|d| d.round_dp(2));

        let row = insert_insight(
            &mut *tx,
            &NewInsight {
                agent_run_id: run_id,
                insight_type: draft.insight_type.as_str(),
                campaign_id: draft.campaign_id,
                metric: draft.metric,
                change_percent,
                description: &draft.description,
                severity: draft.severity.as_str(),
            },
        )
        .await?;
        rows.push(row);
    }
    tx.commit().await.map_err(DbError::from)?;

    tracing::info!(
        run_id,
        campaigns = current.len(),
        insights = rows.len(),
        "analysis stage complete"
    );

    Ok(rows)
}
