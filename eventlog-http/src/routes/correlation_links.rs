//! `POST /v1/correlation-links`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use eventlog_core::{CorrelationLink, CreateCorrelationLinkRequest};

use crate::error::ApiError;
use crate::state::AppState;

#[tracing::instrument(skip(state), fields(correlation_id = %body.correlation_id, account_id = %body.account_id))]
pub async fn create_correlation_link(
    State(state): State<AppState>,
    Json(body): Json<CreateCorrelationLinkRequest>,
) -> Result<(StatusCode, Json<CorrelationLink>), ApiError> {
    if body.correlation_id.trim().is_empty() || body.correlation_id.chars().count() > 200 {
        return Err(ApiError::validation(vec![eventlog_core::FieldError {
            field: "correlation_id",
            message: "must be 1-200 characters".to_string(),
        }]));
    }
    if body.account_id.trim().is_empty() || body.account_id.chars().count() > 64 {
        return Err(ApiError::validation(vec![eventlog_core::FieldError {
            field: "account_id",
            message: "must be 1-64 characters".to_string(),
        }]));
    }

    let link = CorrelationLink {
        correlation_id: body.correlation_id,
        account_id: body.account_id,
        application_id: body.application_id,
        customer_id: body.customer_id,
        card_last4: body.card_last4,
    };
    state.correlation_links.upsert(&link).await?;
    Ok((StatusCode::CREATED, Json(link)))
}
