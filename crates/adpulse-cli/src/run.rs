//! `run` and `runs` commands: trigger the analysis pipeline and inspect
//! recent agent runs.

use adpulse_core::AnalysisThresholds;
use adpulse_pipeline::{RunParams, TemplateGenerator};
use sqlx::PgPool;

/// Executes one weekly analysis run and prints its summary.
pub async fn run_analysis(
    pool: &PgPool,
    days_back: i64,
    comparison_days: i64,
) -> anyhow::Result<()> {
    let params = RunParams {
        days_back,
        comparison_days,
    };

    let run = adpulse_pipeline::run_weekly_analysis(
        pool,
        &AnalysisThresholds::default(),
        &TemplateGenerator,
        params,
    )
    .await?;

    println!("Run {} {}", run.public_id, run.status);
    if let Some(output) = &run.output {
        if let Some(summary) = output.get("summary").and_then(|s| s.as_str()) {
            println!("  {summary}");
        }
        if let Some(metrics) = output.get("metrics") {
            println!(
                "  insights: {}, actions: {}, creatives: {}",
                metrics["total_insights"], metrics["total_actions"], metrics["total_creatives"]
            );
        }
    }

    Ok(())
}

/// Prints the most recent agent runs, newest first.
pub async fn list_runs(pool: &PgPool, limit: i64) -> anyhow::Result<()> {
    let runs = adpulse_db::list_agent_runs(pool, None, None, limit).await?;

    if runs.is_empty() {
        println!("No agent runs recorded yet");
        return Ok(());
    }

    for run in runs {
        let completed = run
            .completed_at
            .map_or_else(|| "-".to_string(), |t| t.to_rfc3339());
        println!(
            "{}  {:<9}  started {}  completed {}",
            run.public_id,
            run.status,
            run.started_at.to_rfc3339(),
            completed
        );
        if let Some(error) = &run.error_message {
            println!("    error: {error}");
        }
    }

    Ok(())
}
