//! Stage 2: decision engine.
//!
//! Groups a run's insights by campaign and applies a fixed-priority rule
//! table to derive at most one recommended action per campaign.

use std::collections::BTreeMap;

use adpulse_core::{ActionType, InsightType, Priority, Severity};
use adpulse_db::{insert_action, ActionRow, DbError, InsightRow, NewAction};
use sqlx::PgPool;

use crate::PipelineError;

const FIX_DESCRIPTION: &str =
    "High severity performance drop detected - requires investigation";
const SCALE_DESCRIPTION: &str = "Strong performance - recommend scaling budget";
const TEST_DESCRIPTION: &str = "Mixed signals - recommend testing new creative variants";

/// A decided action before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionDraft {
    pub campaign_id: i64,
    pub action_type: ActionType,
    pub description: &'static str,
    pub priority: Priority,
}

/// Applies the decision table to a run's insights.
///
/// Rules are evaluated in fixed order per campaign, first match wins:
/// 1. any high-severity drop → fix (high priority);
/// 2. opportunity present, no drop at all → scale (high priority);
/// 3. opportunity present alongside lesser drops → test (medium priority);
/// 4. otherwise no action.
#[must_use]
pub fn decide_actions(insights: &[InsightRow]) -> Vec<ActionDraft> {
    let mut by_campaign: BTreeMap<i64, Vec<&InsightRow>> = BTreeMap::new();
    for insight in insights {
        by_campaign.entry(insight.campaign_id).or_default().push(insight);
    }

    let mut drafts = Vec::new();
    for (campaign_id, campaign_insights) in by_campaign {
        let has_drop = campaign_insights
            .iter()
            .any(|i| i.insight_type == InsightType::Drop.as_str());
        let has_opportunity = campaign_insights
            .iter()
            .any(|i| i.insight_type == InsightType::Opportunity.as_str());
        let has_high_severity_drop = campaign_insights.iter().any(|i| {
            i.insight_type == InsightType::Drop.as_str() && i.severity == Severity::High.as_str()
        });

        let draft = if has_high_severity_drop {
            Some((ActionType::Fix, FIX_DESCRIPTION, Priority::High))
        } else if has_opportunity && !has_drop {
            Some((ActionType::Scale, SCALE_DESCRIPTION, Priority::High))
        } else if has_opportunity {
            Some((ActionType::Test, TEST_DESCRIPTION, Priority::Medium))
        } else {
            None
        };

        if let Some((action_type, description, priority)) = draft {
            drafts.push(ActionDraft {
                campaign_id,
                action_type,
                description,
                priority,
            });
        }
    }

    drafts
}

/// Runs the decision stage for one run: decides and persists actions in one
/// stage transaction.
///
/// # Errors
///
/// Returns [`PipelineError::Db`] if persistence fails.
pub async fn decide(
    pool: &PgPool,
    run_id: i64,
    insights: &[InsightRow],
) -> Result<Vec<ActionRow>, PipelineError> {
    let drafts = decide_actions(insights);

    let mut tx = pool.begin().await.map_err(DbError::from)?;
    let mut rows = Vec::with_capacity(drafts.len());
    for draft in &drafts {
        let row = insert_action(
            &mut *tx,
            &NewAction {
                agent_run_id: run_id,
                action_type: draft.action_type.as_str(),
                campaign_id: Some(draft.campaign_id),
                description: draft.description,
                priority: draft.priority.as_str(),
            },
        )
        .await?;
        rows.push(row);
    }
    tx.commit().await.map_err(DbError::from)?;

    tracing::info!(run_id, actions = rows.len(), "decision stage complete");

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn insight(campaign_id: i64, insight_type: InsightType, severity: Severity) -> InsightRow {
        InsightRow {
            id: 0,
            agent_run_id: 1,
            insight_type: insight_type.as_str().to_string(),
            campaign_id,
            metric: "roas".to_string(),
            change_percent: None,
            description: String::new(),
            severity: severity.as_str().to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn high_severity_drop_wins_over_everything() {
        // One high drop plus an opportunity: fix, never scale or test.
        let insights = vec![
            insight(1, InsightType::Drop, Severity::High),
            insight(1, InsightType::Opportunity, Severity::High),
        ];
        let drafts = decide_actions(&insights);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].action_type, ActionType::Fix);
        assert_eq!(drafts[0].priority, Priority::High);
    }

    #[test]
    fn pure_opportunity_scales() {
        let insights = vec![
            insight(1, InsightType::Opportunity, Severity::Medium),
            insight(1, InsightType::Opportunity, Severity::High),
        ];
        let drafts = decide_actions(&insights);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].action_type, ActionType::Scale);
        assert_eq!(drafts[0].priority, Priority::High);
    }

    #[test]
    fn mixed_signals_recommend_a_test() {
        let insights = vec![
            insight(1, InsightType::Drop, Severity::Medium),
            insight(1, InsightType::Opportunity, Severity::Medium),
        ];
        let drafts = decide_actions(&insights);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].action_type, ActionType::Test);
        assert_eq!(drafts[0].priority, Priority::Medium);
    }

    #[test]
    fn medium_drops_alone_produce_no_action() {
        let insights = vec![insight(1, InsightType::Drop, Severity::Medium)];
        let drafts = decide_actions(&insights);
        assert!(drafts.is_empty());
    }

    #[test]
    fn at_most_one_action_per_campaign() {
        let insights = vec![
            insight(1, InsightType::Drop, Severity::High),
            insight(1, InsightType::Drop, Severity::High),
            insight(2, InsightType::Opportunity, Severity::Medium),
        ];
        let drafts = decide_actions(&insights);
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].campaign_id, 1);
        assert_eq!(drafts[0].action_type, ActionType::Fix);
        assert_eq!(drafts[1].campaign_id, 2);
        assert_eq!(drafts[1].action_type, ActionType::Scale);
    }

    #[test]
    fn no_insights_no_actions() {
        assert!(decide_actions(&[]).is_empty());
    }
}
