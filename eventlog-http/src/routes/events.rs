//! `POST /v1/events`, `POST /v1/events/batch`, and the read paths over
//! correlation/trace/account/batch/search.

use std::collections::HashSet;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use eventlog_core::batch::{
    InsertBatchResponse, InsertExplicitBatchRequest, InsertExplicitBatchResponse,
    InsertEventsRequest,
};
use eventlog_core::query::{
    AccountEventsFilter, AccountEventsResponse, BatchEventsResponse, BatchSummaryResponse,
    CorrelationEventsResponse, SearchEventsResponse, SearchFilter, TraceEventsResponse,
};
use eventlog_core::{validate_event, Event, PageRequest};

use crate::error::ApiError;
use crate::state::AppState;

/// Validates every event in a (possibly single-element) batch, collecting
/// field errors tagged by index so a caller sees every problem at once
/// rather than one at a time.
fn validate_all(events: &[Event]) -> Result<(), ApiError> {
    let mut indexed_errors = Vec::new();
    for (index, event) in events.iter().enumerate() {
        if let Err(errors) = validate_event(event) {
            indexed_errors.extend(errors.into_iter().map(|e| (index, e)));
        }
    }
    if indexed_errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::indexed_validation(indexed_errors))
    }
}

#[tracing::instrument(skip(state, body), fields(count = tracing::field::Empty))]
pub async fn insert_events(
    State(state): State<AppState>,
    Json(body): Json<InsertEventsRequest>,
) -> Result<(StatusCode, Json<InsertBatchResponse>), ApiError> {
    let events = body.into_vec();
    tracing::Span::current().record("count", events.len());
    validate_all(&events)?;

    let outcome = state.event_store.insert_batch(&events).await?;
    tracing::info!(
        inserted = outcome.execution_ids.iter().filter(|i| i.is_some()).count(),
        errors = outcome.errors.len(),
        "insert_events"
    );
    Ok((
        StatusCode::CREATED,
        Json(InsertBatchResponse {
            execution_ids: outcome.execution_ids,
            errors: outcome.errors,
        }),
    ))
}

#[tracing::instrument(skip(state, body), fields(batch_id = %body.batch_id, count = body.events.len()))]
pub async fn insert_batch(
    State(state): State<AppState>,
    Json(body): Json<InsertExplicitBatchRequest>,
) -> Result<(StatusCode, Json<InsertExplicitBatchResponse>), ApiError> {
    validate_all(&body.events)?;

    let mut events = body.events;
    for event in &mut events {
        event.batch_id = Some(body.batch_id.clone());
    }

    let outcome = state.event_store.insert_batch(&events).await?;
    let total_inserted = outcome.execution_ids.iter().filter(|i| i.is_some()).count();
    let correlation_ids: Vec<String> = events
        .iter()
        .map(|e| e.correlation_id.clone())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    tracing::info!(total_inserted, errors = outcome.errors.len(), "insert_batch");
    Ok((
        StatusCode::CREATED,
        Json(InsertExplicitBatchResponse {
            batch_id: body.batch_id,
            execution_ids: outcome.execution_ids,
            errors: outcome.errors,
            total_inserted,
            correlation_ids,
        }),
    ))
}

pub async fn get_correlation_events(
    State(state): State<AppState>,
    Path(correlation_id): Path<String>,
) -> Result<Json<CorrelationEventsResponse>, ApiError> {
    let response = eventlog_query::get_correlation_events(&state.pool, &correlation_id).await?;
    Ok(Json(response))
}

pub async fn get_trace_events(
    State(state): State<AppState>,
    Path(trace_id): Path<String>,
) -> Result<Json<TraceEventsResponse>, ApiError> {
    let response = eventlog_query::get_trace_events(&state.pool, &trace_id).await?;
    Ok(Json(response))
}

pub async fn get_account_events(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    Query(filter): Query<AccountEventsFilter>,
) -> Result<Json<AccountEventsResponse>, ApiError> {
    let response = eventlog_query::get_account_events(&state.pool, &account_id, &filter).await?;
    Ok(Json(response))
}

#[derive(Debug, serde::Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

pub async fn get_batch_events(
    State(state): State<AppState>,
    Path(batch_id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<BatchEventsResponse>, ApiError> {
    let page_request = PageRequest::new(params.page, params.page_size);
    let response = eventlog_query::get_batch_events(&state.pool, &batch_id, page_request).await?;
    Ok(Json(response))
}

pub async fn get_batch_summary(
    State(state): State<AppState>,
    Path(batch_id): Path<String>,
) -> Result<Json<BatchSummaryResponse>, ApiError> {
    let response = eventlog_query::get_batch_summary(&state.pool, &batch_id).await?;
    Ok(Json(response))
}

pub async fn search_events(
    State(state): State<AppState>,
    Query(filter): Query<SearchFilter>,
) -> Result<Json<SearchEventsResponse>, ApiError> {
    let response =
        eventlog_query::search_events(&state.pool, &filter, state.fulltext_enabled).await?;
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use eventlog_core::event::{EventStatus, EventType};
    use std::collections::HashMap;

    fn base_event() -> Event {
        Event {
            execution_id: None,
            correlation_id: "corr-1".into(),
            trace_id: "trace-1".into(),
            span_id: None,
            parent_span_id: None,
            span_links: None,
            account_id: None,
            batch_id: None,
            application_id: "app".into(),
            originating_system: "svc-a".into(),
            target_system: "svc-b".into(),
            process_name: "onboarding".into(),
            step_sequence: Some(0),
            step_name: None,
            event_type: EventType::ProcessStart,
            event_status: EventStatus::Success,
            identifiers: HashMap::new(),
            metadata: None,
            summary: "started".into(),
            result: None,
            event_timestamp: chrono::Utc::now(),
            endpoint: None,
            http_method: None,
            http_status_code: None,
            request_payload: None,
            response_payload: None,
            error_code: None,
            error_message: None,
            execution_time_ms: None,
            idempotency_key: None,
            is_deleted: false,
        }
    }

    #[test]
    fn validate_all_accepts_well_formed_batch() {
        assert!(validate_all(&[base_event(), base_event()]).is_ok());
    }

    #[test]
    fn validate_all_tags_errors_with_the_offending_index() {
        let mut bad = base_event();
        bad.summary = String::new();
        let events = vec![base_event(), bad, base_event()];

        let err = validate_all(&events).unwrap_err();
        match err {
            ApiError::Validation(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].index, Some(1));
                assert_eq!(errors[0].field, "summary");
            }
            other => panic!("expected a validation error, got {other:?}"),
        }
    }
}
