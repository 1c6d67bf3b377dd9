use adpulse_core::ValidationError;
use adpulse_db::DbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    /// A required field was missing or a value could not be coerced.
    /// Recoverable: surfaced to the caller for a single record, recorded
    /// per-record in a batch.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Storage failure, including duplicate-key constraint violations from
    /// concurrent writers. Aborts the current record only.
    #[error(transparent)]
    Db(#[from] DbError),
}

impl IngestError {
    /// True when the failure is a client-side data problem rather than a
    /// storage fault. Transport callers map this to a 4xx response.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, IngestError::Validation(_))
    }
}
