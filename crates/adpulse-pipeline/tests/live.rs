//! Live end-to-end tests for the analysis pipeline using `#[sqlx::test]`.
//!
//! Data is seeded directly through the upsert store so each scenario can pin
//! exact window contents relative to today (the runner derives its windows
//! from the current date).

use adpulse_core::{AnalysisThresholds, CanonicalMetric};
use adpulse_db::{
    get_agent_run, list_actions_for_run, list_creatives_for_run, list_insights_for_run,
    upsert_campaign, upsert_daily_metric, ActionRow,
};
use adpulse_pipeline::{
    run_weekly_analysis, BrandContext, CreativeDraft, CreativeGenerator, PipelineError, RunParams,
    TemplateGenerator,
};
use chrono::{Days, NaiveDate, Utc};
use rust_decimal::Decimal;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// A date inside the current comparison window `[today - 7, today)`.
fn current_day() -> NaiveDate {
    today().checked_sub_days(Days::new(2)).expect("date")
}

/// A date inside the previous comparison window `[today - 14, today - 7)`.
fn previous_day() -> NaiveDate {
    today().checked_sub_days(Days::new(9)).expect("date")
}

struct DayTotals {
    impressions: i64,
    clicks: i64,
    spend: i64,
    conversions: i64,
    revenue: i64,
}

async fn seed_day(pool: &sqlx::PgPool, external_id: &str, day: NaiveDate, totals: DayTotals) {
    let metric = CanonicalMetric {
        external_id: external_id.to_string(),
        campaign_name: format!("Campaign {external_id}"),
        date: day,
        impressions: totals.impressions,
        clicks: totals.clicks,
        spend: Decimal::from(totals.spend),
        conversions: totals.conversions,
        revenue: Decimal::from(totals.revenue),
        source: "meta_ads".to_string(),
        status: "active".to_string(),
    };
    let campaign = upsert_campaign(pool, &metric).await.expect("campaign");
    upsert_daily_metric(pool, &metric, campaign.id)
        .await
        .expect("metric");
}

/// Steady baseline: roas 10, ctr 1%, conversion rate 10%.
fn baseline() -> DayTotals {
    DayTotals {
        impressions: 10_000,
        clicks: 100,
        spend: 100,
        conversions: 10,
        revenue: 1_000,
    }
}

/// Seed a campaign that collapsed: revenue (and roas) down 60%.
async fn seed_collapsing_campaign(pool: &sqlx::PgPool, external_id: &str) {
    seed_day(pool, external_id, previous_day(), baseline()).await;
    seed_day(
        pool,
        external_id,
        current_day(),
        DayTotals {
            revenue: 400,
            ..baseline()
        },
    )
    .await;
}

/// Seed a campaign that doubled its revenue: pure opportunity.
async fn seed_surging_campaign(pool: &sqlx::PgPool, external_id: &str) {
    seed_day(pool, external_id, previous_day(), baseline()).await;
    seed_day(
        pool,
        external_id,
        current_day(),
        DayTotals {
            revenue: 2_000,
            ..baseline()
        },
    )
    .await;
}

/// Seed a campaign with mixed signals: ctr up 25%, revenue/roas down 22%,
/// conversion rate unchanged. Decision table rule 3 → test action.
async fn seed_mixed_campaign(pool: &sqlx::PgPool, external_id: &str) {
    seed_day(pool, external_id, previous_day(), baseline()).await;
    seed_day(
        pool,
        external_id,
        current_day(),
        DayTotals {
            impressions: 8_000,
            revenue: 780,
            ..baseline()
        },
    )
    .await;
}

struct FailingGenerator;

impl CreativeGenerator for FailingGenerator {
    fn generate(
        &self,
        _brand: &BrandContext,
        _action: &ActionRow,
    ) -> Result<CreativeDraft, PipelineError> {
        Err(PipelineError::Generation(
            "backend unavailable".to_string(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Full pipeline runs
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn empty_database_completes_with_no_changes(pool: sqlx::PgPool) {
    let run = run_weekly_analysis(
        &pool,
        &AnalysisThresholds::default(),
        &TemplateGenerator,
        RunParams::default(),
    )
    .await
    .expect("run");

    assert_eq!(run.status, "completed");
    assert!(run.completed_at.is_some());
    let output = run.output.expect("output");
    assert_eq!(output["summary"], "No significant changes detected.");
    assert_eq!(output["metrics"]["total_insights"], 0);
    assert_eq!(run.input_params["days_back"], 30);
    assert_eq!(run.input_params["comparison_days"], 7);
}

#[sqlx::test(migrations = "../../migrations")]
async fn full_pipeline_produces_insights_actions_and_creatives(pool: sqlx::PgPool) {
    seed_collapsing_campaign(&pool, "meta_collapse").await;
    seed_surging_campaign(&pool, "meta_surge").await;
    seed_mixed_campaign(&pool, "meta_mixed").await;

    let run = run_weekly_analysis(
        &pool,
        &AnalysisThresholds::default(),
        &TemplateGenerator,
        RunParams::default(),
    )
    .await
    .expect("run");

    assert_eq!(run.status, "completed");

    // Collapse: roas + revenue high drops. Surge: roas + revenue high
    // opportunities. Mixed: ctr opportunity + roas/revenue medium drops.
    let insights = list_insights_for_run(&pool, run.id).await.expect("list");
    assert_eq!(insights.len(), 7);

    let actions = list_actions_for_run(&pool, run.id).await.expect("list");
    assert_eq!(actions.len(), 3);
    let mut action_types: Vec<&str> = actions.iter().map(|a| a.action_type.as_str()).collect();
    action_types.sort_unstable();
    assert_eq!(action_types, ["fix", "scale", "test"]);

    // Exactly one creative, staged for the test action.
    let creatives = list_creatives_for_run(&pool, run.id).await.expect("list");
    assert_eq!(creatives.len(), 1);
    assert_eq!(creatives[0].status, "draft");
    let test_action = actions
        .iter()
        .find(|a| a.action_type == "test")
        .expect("test action");
    assert_eq!(creatives[0].action_id, Some(test_action.id));

    let output = run.output.expect("output");
    assert_eq!(
        output["summary"],
        "4 performance drop(s) detected. 3 opportunity(ies) identified. \
         1 scaling recommendation(s). 1 test(s) recommended."
    );
    assert_eq!(output["metrics"]["total_insights"], 7);
    assert_eq!(output["metrics"]["total_actions"], 3);
    assert_eq!(output["metrics"]["total_creatives"], 1);
    assert_eq!(output["metrics"]["action_breakdown"]["fix"], 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn campaign_only_in_current_window_is_a_new_campaign(pool: sqlx::PgPool) {
    seed_day(&pool, "meta_new", current_day(), baseline()).await;

    let run = run_weekly_analysis(
        &pool,
        &AnalysisThresholds::default(),
        &TemplateGenerator,
        RunParams::default(),
    )
    .await
    .expect("run");

    let insights = list_insights_for_run(&pool, run.id).await.expect("list");
    assert_eq!(insights.len(), 1);
    assert_eq!(insights[0].metric, "new_campaign");
    assert_eq!(insights[0].insight_type, "opportunity");
    assert_eq!(insights[0].severity, "medium");
    assert!(insights[0].change_percent.is_none());
    assert_eq!(insights[0].description, "New campaign detected");
}

#[sqlx::test(migrations = "../../migrations")]
async fn repeated_runs_append_new_rows_per_run(pool: sqlx::PgPool) {
    seed_surging_campaign(&pool, "meta_surge").await;

    let thresholds = AnalysisThresholds::default();
    let first = run_weekly_analysis(&pool, &thresholds, &TemplateGenerator, RunParams::default())
        .await
        .expect("first run");
    let second = run_weekly_analysis(&pool, &thresholds, &TemplateGenerator, RunParams::default())
        .await
        .expect("second run");

    assert_ne!(first.id, second.id);
    // Each run owns its own insight rows; earlier runs stay queryable.
    let first_insights = list_insights_for_run(&pool, first.id).await.expect("list");
    let second_insights = list_insights_for_run(&pool, second.id).await.expect("list");
    assert_eq!(first_insights.len(), 2);
    assert_eq!(second_insights.len(), 2);
}

// ---------------------------------------------------------------------------
// Failure propagation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn stage_failure_marks_run_failed_and_keeps_prior_output(pool: sqlx::PgPool) {
    // Mixed campaign yields a test action, which forces the content stage to
    // invoke the (failing) generator.
    seed_mixed_campaign(&pool, "meta_mixed").await;

    let err = run_weekly_analysis(
        &pool,
        &AnalysisThresholds::default(),
        &FailingGenerator,
        RunParams::default(),
    )
    .await
    .expect_err("generator failure must propagate");
    assert!(matches!(err, PipelineError::Generation(_)));

    // Exactly one run exists and it is failed with the message captured.
    let run_id: i64 = sqlx::query_scalar("SELECT id FROM agent_runs")
        .fetch_one(&pool)
        .await
        .expect("run id");
    let run = get_agent_run(&pool, run_id).await.expect("run");
    assert_eq!(run.status, "failed");
    assert!(run.completed_at.is_some());
    let message = run.error_message.expect("error_message");
    assert!(message.contains("backend unavailable"), "got: {message}");
    assert!(run.output.is_none());

    // Stage 1 and 2 output committed before the failure remains queryable.
    let insights = list_insights_for_run(&pool, run.id).await.expect("list");
    assert_eq!(insights.len(), 3);
    let actions = list_actions_for_run(&pool, run.id).await.expect("list");
    assert_eq!(actions.len(), 1);

    // The failing stage left no partial creatives behind.
    let creatives = list_creatives_for_run(&pool, run.id).await.expect("list");
    assert!(creatives.is_empty());
}
