use thiserror::Error;

/// Postgres SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";
/// SQLSTATE for `check_violation`, raised by the `http_method` CHECK
/// constraint.
const CHECK_VIOLATION: &str = "23514";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violation: {0}")]
    UniqueConflict(String),

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Classifies a raw `sqlx::Error` from an insert attempt using the
/// Postgres SQLSTATE, specialized for the two constraint kinds this store
/// cares about.
pub fn classify_insert_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            Some(UNIQUE_VIOLATION) => return StoreError::UniqueConflict(db_err.to_string()),
            Some(CHECK_VIOLATION) => return StoreError::ConstraintViolation(db_err.to_string()),
            _ => {}
        }
    }
    StoreError::Database(err)
}
