use crate::validation::FieldError;
use thiserror::Error;

/// Error kinds shared across the platform. Each transport layer
/// (`eventlog-http`, `eventlog-sink`) maps these onto its own wire shape —
/// this enum carries the semantics, not the HTTP status code.
#[derive(Debug, Error)]
pub enum EventLogError {
    #[error("validation failed: {0:?}")]
    Validation(Vec<FieldError>),

    #[error("unique constraint violation on {field}")]
    UniqueConflict { field: &'static str },

    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
