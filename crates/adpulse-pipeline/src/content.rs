//! Stage 3: creative staging.
//!
//! Filters the run's actions to test recommendations and stages one draft
//! creative per action through the configured [`CreativeGenerator`].

use adpulse_core::ActionType;
use adpulse_db::{insert_creative, ActionRow, CreativeRow, DbError, NewCreative};
use sqlx::PgPool;

use crate::generator::{BrandContext, CreativeGenerator};
use crate::PipelineError;

/// Runs the content stage for one run.
///
/// Only actions of type `test` receive a creative. Generated drafts are
/// persisted in one stage transaction with status `draft`, linked to the run
/// and the source action. A generation failure aborts the stage before the
/// transaction commits, so no partial creative set is left behind.
///
/// # Errors
///
/// Returns [`PipelineError::Generation`] if the backend fails, or
/// [`PipelineError::Db`] if persistence fails.
pub async fn create(
    pool: &PgPool,
    run_id: i64,
    generator: &dyn CreativeGenerator,
    brand: &BrandContext,
    actions: &[ActionRow],
) -> Result<Vec<CreativeRow>, PipelineError> {
    let test_actions: Vec<&ActionRow> = actions
        .iter()
        .filter(|a| a.action_type == ActionType::Test.as_str())
        .collect();

    if test_actions.is_empty() {
        tracing::info!(run_id, "content stage complete (no test actions)");
        return Ok(Vec::new());
    }

    let mut tx = pool.begin().await.map_err(DbError::from)?;
    let mut rows = Vec::with_capacity(test_actions.len());
    for action in test_actions {
        let draft = generator.generate(brand, action)?;
        let row = insert_creative(
            &mut *tx,
            &NewCreative {
                agent_run_id: run_id,
                action_id: Some(action.id),
                platform: &draft.platform,
                creative_type: &draft.creative_type,
                headline: &draft.headline,
                primary_text: &draft.primary_text,
                description: &draft.description,
                call_to_action: &draft.call_to_action,
            },
        )
        .await?;
        rows.push(row);
    }
    tx.commit().await.map_err(DbError::from)?;

    tracing::info!(run_id, creatives = rows.len(), "content stage complete");

    Ok(rows)
}
