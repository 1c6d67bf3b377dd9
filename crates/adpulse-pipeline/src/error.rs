use adpulse_db::DbError;
use thiserror::Error;

/// Unexpected failure inside a pipeline stage.
///
/// Any variant aborts the remainder of the run; the runner records the
/// message on the run row and re-raises the error to its caller. Output
/// already committed by earlier stages stays persisted.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("creative generation failed: {0}")]
    Generation(String),

    #[error("failed to serialize run output: {0}")]
    Serialize(#[from] serde_json::Error),
}
