//! Canonical metric record and the classification vocabulary shared by the
//! ingestion and analysis pipelines.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A source-independent daily metric record.
///
/// Produced by [`crate::normalize_metric`] from raw platform payloads and
/// consumed by the upsert store. Field names are fixed regardless of the
/// originating source schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalMetric {
    pub external_id: String,
    pub campaign_name: String,
    pub date: NaiveDate,
    pub impressions: i64,
    pub clicks: i64,
    pub spend: Decimal,
    pub conversions: i64,
    pub revenue: Decimal,
    pub source: String,
    pub status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightType {
    Drop,
    Opportunity,
}

impl InsightType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            InsightType::Drop => "drop",
            InsightType::Opportunity => "opportunity",
        }
    }
}

impl std::fmt::Display for InsightType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Medium,
    High,
}

impl Severity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Fix,
    Scale,
    Test,
}

impl ActionType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ActionType::Fix => "fix",
            ActionType::Scale => "scale",
            ActionType::Test => "test",
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Urgency of a recommended action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Medium,
    High,
}

impl Priority {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of an agent run. Transitions are monotonic:
/// `Running` moves exactly once to `Completed` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The derived metrics compared between adjacent windows, in evaluation order.
pub const COMPARED_METRICS: [&str; 4] = ["roas", "ctr", "conversion_rate", "revenue"];

/// Synthetic metric name used for campaigns absent from the previous window.
pub const METRIC_NEW_CAMPAIGN: &str = "new_campaign";

/// Percent-change classification thresholds.
///
/// These encode business policy, not implementation detail: a change below
/// `drop_pct` is a drop (high severity below `severe_drop_pct`), a change
/// above `opportunity_pct` is an opportunity (high severity above
/// `strong_opportunity_pct`). Boundary values are exclusive on both sides:
/// exactly -20.00 or +20.00 produces no insight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisThresholds {
    pub drop_pct: f64,
    pub severe_drop_pct: f64,
    pub opportunity_pct: f64,
    pub strong_opportunity_pct: f64,
}

impl Default for AnalysisThresholds {
    fn default() -> Self {
        Self {
            drop_pct: -20.0,
            severe_drop_pct: -30.0,
            opportunity_pct: 20.0,
            strong_opportunity_pct: 50.0,
        }
    }
}
