//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the
//! recurring weekly analysis job when enabled by configuration.

use std::sync::Arc;

use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use adpulse_pipeline::{RunParams, TemplateGenerator};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process — dropping it shuts down all jobs.
/// When `config.scheduler_enabled` is false an empty scheduler is returned
/// so the server behaves identically either way.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    config: Arc<adpulse_core::AppConfig>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    if config.scheduler_enabled {
        register_weekly_analysis_job(&scheduler, pool, config).await?;
    } else {
        tracing::info!("scheduler: weekly analysis job disabled by configuration");
    }

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the weekly analysis job.
///
/// Runs every Monday at 06:00 UTC (`0 0 6 * * MON`), replaying the same
/// pipeline the `/api/v1/agent/run-weekly` endpoint triggers on demand.
async fn register_weekly_analysis_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    config: Arc<adpulse_core::AppConfig>,
) -> Result<(), JobSchedulerError> {
    let pool = Arc::new(pool);

    let job = Job::new_async("0 0 6 * * MON", move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        let config = Arc::clone(&config);

        Box::pin(async move {
            tracing::info!("scheduler: starting weekly analysis run");
            run_weekly_job(&pool, &config).await;
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

/// Drive one scheduled weekly analysis run, logging the outcome.
async fn run_weekly_job(pool: &PgPool, config: &adpulse_core::AppConfig) {
    let params = RunParams {
        days_back: config.analysis_days_back,
        comparison_days: config.analysis_comparison_days,
    };

    match adpulse_pipeline::run_weekly_analysis(
        pool,
        &config.thresholds,
        &TemplateGenerator,
        params,
    )
    .await
    {
        Ok(run) => {
            tracing::info!(
                run_id = %run.public_id,
                status = %run.status,
                "scheduler: weekly analysis run complete"
            );
        }
        Err(e) => {
            // The run row already carries the failure; nothing to retry here.
            tracing::error!(error = %e, "scheduler: weekly analysis run failed");
        }
    }
}
