//! Run orchestration: creates the agent-run record, sequences the four
//! stages, and settles the run's terminal status.

use adpulse_core::AnalysisThresholds;
use adpulse_db::{complete_agent_run, create_agent_run, fail_agent_run, get_agent_run, AgentRunRow};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::generator::{BrandContext, CreativeGenerator};
use crate::{analytics, content, report, strategist, PipelineError, Report};

pub const RUN_TYPE_WEEKLY: &str = "weekly";

/// Input parameters of one analysis run, captured verbatim on the run row.
///
/// `days_back` is recorded for operators but does not bound the comparator:
/// both windows derive from `comparison_days` alone.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RunParams {
    pub days_back: i64,
    pub comparison_days: i64,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            days_back: 30,
            comparison_days: 7,
        }
    }
}

/// Executes the full weekly pipeline inside one agent-run record.
///
/// Creates the run with status `running`, then sequences
/// analyze → decide → create → aggregate. On success the run is completed
/// with the report as its output; on any stage failure the run is marked
/// failed with the error message and the original error is returned to the
/// caller. Output committed by stages before the failure is not rolled back.
///
/// # Errors
///
/// Returns the failing stage's [`PipelineError`], or [`PipelineError::Db`]
/// if the run record itself cannot be created or settled.
pub async fn run_weekly_analysis(
    pool: &PgPool,
    thresholds: &AnalysisThresholds,
    generator: &dyn CreativeGenerator,
    params: RunParams,
) -> Result<AgentRunRow, PipelineError> {
    let input_params = serde_json::to_value(params)?;
    let run = create_agent_run(pool, RUN_TYPE_WEEKLY, &input_params).await?;
    tracing::info!(run_id = %run.public_id, ?params, "agent run started");

    match execute_stages(pool, thresholds, generator, &run, params).await {
        Ok(run_report) => {
            let output = serde_json::to_value(&run_report)?;
            complete_agent_run(pool, run.id, &output).await?;
            tracing::info!(
                run_id = %run.public_id,
                summary = %run_report.summary,
                "agent run completed"
            );
            Ok(get_agent_run(pool, run.id).await?)
        }
        Err(e) => {
            // Best effort: a failure to record the failure must not mask the
            // original stage error.
            if let Err(settle_err) = fail_agent_run(pool, run.id, &e.to_string()).await {
                tracing::error!(
                    run_id = %run.public_id,
                    error = %settle_err,
                    "failed to mark agent run as failed"
                );
            }
            tracing::error!(run_id = %run.public_id, error = %e, "agent run failed");
            Err(e)
        }
    }
}

/// The four pipeline stages in fixed order, each committing its own writes.
async fn execute_stages(
    pool: &PgPool,
    thresholds: &AnalysisThresholds,
    generator: &dyn CreativeGenerator,
    run: &AgentRunRow,
    params: RunParams,
) -> Result<Report, PipelineError> {
    let end_date = Utc::now().date_naive();

    // Stage 1: compare adjacent windows and persist insights.
    let insights =
        analytics::analyze(pool, thresholds, run.id, end_date, params.comparison_days).await?;

    // Stage 2: derive at most one action per campaign.
    let actions = strategist::decide(pool, run.id, &insights).await?;

    // Stage 3: stage draft creatives for test actions.
    let creatives =
        content::create(pool, run.id, generator, &BrandContext::default(), &actions).await?;

    // Stage 4: assemble the aggregated report.
    Ok(report::aggregate(run.public_id, insights, actions, creatives))
}
