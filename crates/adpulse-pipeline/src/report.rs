//! Stage 4: report aggregation.
//!
//! Pure assembly of a run's outputs into one executive report document: type
//! breakdowns, a composed summary sentence, and the full output lists.

use std::collections::BTreeMap;

use adpulse_core::{ActionType, InsightType};
use adpulse_db::{ActionRow, CreativeRow, InsightRow};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// The aggregated output of one run, stored verbatim on the run row.
#[derive(Debug, Serialize)]
pub struct Report {
    pub run_id: Uuid,
    pub run_date: DateTime<Utc>,
    pub summary: String,
    pub insights: Vec<InsightRow>,
    pub actions: Vec<ActionRow>,
    pub creatives: Vec<CreativeRow>,
    pub metrics: ReportMetrics,
}

/// Count breakdowns accompanying the report.
#[derive(Debug, Serialize)]
pub struct ReportMetrics {
    pub total_insights: usize,
    pub total_actions: usize,
    pub total_creatives: usize,
    pub insight_breakdown: BTreeMap<String, usize>,
    pub action_breakdown: BTreeMap<String, usize>,
}

/// Builds the aggregated report for one run.
#[must_use]
pub fn aggregate(
    run_public_id: Uuid,
    insights: Vec<InsightRow>,
    actions: Vec<ActionRow>,
    creatives: Vec<CreativeRow>,
) -> Report {
    let insight_breakdown = count_by_type(insights.iter().map(|i| i.insight_type.as_str()));
    let action_breakdown = count_by_type(actions.iter().map(|a| a.action_type.as_str()));
    let summary = compose_summary(&insight_breakdown, &action_breakdown);

    let metrics = ReportMetrics {
        total_insights: insights.len(),
        total_actions: actions.len(),
        total_creatives: creatives.len(),
        insight_breakdown,
        action_breakdown,
    };

    Report {
        run_id: run_public_id,
        run_date: Utc::now(),
        summary,
        insights,
        actions,
        creatives,
        metrics,
    }
}

fn count_by_type<'a>(types: impl Iterator<Item = &'a str>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for t in types {
        *counts.entry(t.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Composes the summary sentence from the count breakdowns.
///
/// Clauses appear in fixed order (drops, opportunities, scaling
/// recommendations, tests), each included only when its count is positive,
/// joined with `". "`. With nothing to report the summary is the fixed
/// no-change sentence.
fn compose_summary(
    insight_counts: &BTreeMap<String, usize>,
    action_counts: &BTreeMap<String, usize>,
) -> String {
    let count = |map: &BTreeMap<String, usize>, key: &str| -> usize {
        map.get(key).copied().unwrap_or(0)
    };

    let mut parts = Vec::new();
    let drops = count(insight_counts, InsightType::Drop.as_str());
    if drops > 0 {
        parts.push(format!("{drops} performance drop(s) detected"));
    }
    let opportunities = count(insight_counts, InsightType::Opportunity.as_str());
    if opportunities > 0 {
        parts.push(format!("{opportunities} opportunity(ies) identified"));
    }
    let scales = count(action_counts, ActionType::Scale.as_str());
    if scales > 0 {
        parts.push(format!("{scales} scaling recommendation(s)"));
    }
    let tests = count(action_counts, ActionType::Test.as_str());
    if tests > 0 {
        parts.push(format!("{tests} test(s) recommended"));
    }

    if parts.is_empty() {
        "No significant changes detected.".to_string()
    } else {
        format!("{}.", parts.join(". "))
    }
}
