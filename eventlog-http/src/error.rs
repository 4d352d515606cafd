//! Failure mapping for the `/v1` surface:
//! validation -> 400, unique conflict -> 409, not-found -> 404,
//! everything else -> 500 with a stable error code, never a stack trace.

use axum::{
    body::Body,
    http::{Response, StatusCode},
    response::IntoResponse,
    Json,
};
use eventlog_core::FieldError;
use serde::Serialize;
use thiserror::Error;

/// A validation failure, optionally qualified by the index of the event it
/// came from within a batch request.
#[derive(Debug, Clone)]
pub struct IndexedFieldError {
    pub index: Option<usize>,
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(Vec<IndexedFieldError>),

    #[error("unique constraint violation on {field}")]
    UniqueConflict { field: String },

    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Builds a 400 from a single event's [`FieldError`]s (no batch index).
    pub fn validation(errors: Vec<FieldError>) -> Self {
        ApiError::Validation(
            errors
                .into_iter()
                .map(|e| IndexedFieldError {
                    index: None,
                    field: e.field,
                    message: e.message,
                })
                .collect(),
        )
    }

    /// Builds a 400 from the field errors of one or more events in a batch,
    /// each tagged with its position in the input array.
    pub fn indexed_validation(errors: Vec<(usize, FieldError)>) -> Self {
        ApiError::Validation(
            errors
                .into_iter()
                .map(|(index, e)| IndexedFieldError {
                    index: Some(index),
                    field: e.field,
                    message: e.message,
                })
                .collect(),
        )
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error_code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    field_errors: Vec<FieldErrorBody>,
}

#[derive(Debug, Serialize)]
struct FieldErrorBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    index: Option<usize>,
    field: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response<Body> {
        let (status, error_code, message, field_errors) = match &self {
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "validation_failed",
                "request failed validation".to_string(),
                errors
                    .iter()
                    .map(|e| FieldErrorBody {
                        index: e.index,
                        field: e.field,
                        message: e.message.clone(),
                    })
                    .collect(),
            ),
            ApiError::UniqueConflict { field } => (
                StatusCode::CONFLICT,
                "unique_conflict",
                format!("a row already exists with the same {field}"),
                Vec::new(),
            ),
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                "not_found",
                "no matching resource".to_string(),
                Vec::new(),
            ),
            ApiError::Internal(err) => {
                tracing::error!(error = ?err, "internal error handling request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "an internal error occurred".to_string(),
                    Vec::new(),
                )
            }
        };

        (
            status,
            Json(ErrorBody {
                error_code,
                message,
                field_errors,
            }),
        )
            .into_response()
    }
}

impl From<eventlog_store::StoreError> for ApiError {
    fn from(err: eventlog_store::StoreError) -> Self {
        match err {
            eventlog_store::StoreError::UniqueConflict(_) => ApiError::UniqueConflict {
                field: "idempotency_key".to_string(),
            },
            eventlog_store::StoreError::ConstraintViolation(message) => {
                ApiError::Validation(vec![IndexedFieldError {
                    index: None,
                    field: "http_method",
                    message,
                }])
            }
            other => ApiError::Internal(anyhow::Error::new(other)),
        }
    }
}

impl From<eventlog_query::QueryError> for ApiError {
    fn from(err: eventlog_query::QueryError) -> Self {
        ApiError::Internal(anyhow::Error::new(err))
    }
}
