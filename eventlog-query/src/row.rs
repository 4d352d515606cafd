//! Maps an `events` row back into the wire [`Event`] type. The inverse of
//! `eventlog-store::event_store::bind_event_row`; column names here must
//! stay in step with `eventlog-store::schema::create_events_table`.

use std::collections::HashMap;
use std::str::FromStr;

use eventlog_core::event::{Event, EventStatus, EventType, HttpMethod};
use sqlx::Row;

pub const EVENT_SELECT_COLUMNS: &str = "execution_id, correlation_id, trace_id, span_id, \
parent_span_id, span_links, account_id, batch_id, application_id, originating_system, \
target_system, process_name, step_sequence, step_name, event_type, event_status, identifiers, \
metadata, summary, result, event_timestamp, endpoint, http_method, http_status_code, \
request_payload, response_payload, error_code, error_message, execution_time_ms, \
idempotency_key, is_deleted";

pub fn map_event_row(row: &sqlx::postgres::PgRow) -> Event {
    let event_type_raw: String = row.get("event_type");
    let event_status_raw: String = row.get("event_status");
    let http_method_raw: Option<String> = row.get("http_method");
    let http_status_code: Option<i32> = row.get("http_status_code");
    let span_links: Option<serde_json::Value> = row.get("span_links");
    let identifiers: serde_json::Value = row.get("identifiers");

    Event {
        execution_id: Some(row.get("execution_id")),
        correlation_id: row.get("correlation_id"),
        trace_id: row.get("trace_id"),
        span_id: row.get("span_id"),
        parent_span_id: row.get("parent_span_id"),
        span_links: span_links.and_then(|v| serde_json::from_value(v).ok()),
        account_id: row.get("account_id"),
        batch_id: row.get("batch_id"),
        application_id: row.get("application_id"),
        originating_system: row.get("originating_system"),
        target_system: row.get("target_system"),
        process_name: row.get("process_name"),
        step_sequence: row.get("step_sequence"),
        step_name: row.get("step_name"),
        event_type: EventType::from_str(&event_type_raw).unwrap_or(EventType::Step),
        event_status: EventStatus::from_str(&event_status_raw).unwrap_or(EventStatus::InProgress),
        identifiers: serde_json::from_value::<HashMap<String, String>>(identifiers)
            .unwrap_or_default(),
        metadata: row.get("metadata"),
        summary: row.get("summary"),
        result: row.get("result"),
        event_timestamp: row.get("event_timestamp"),
        endpoint: row.get("endpoint"),
        http_method: http_method_raw.and_then(|m| HttpMethod::from_str(&m).ok()),
        http_status_code: http_status_code.map(|c| c as u16),
        request_payload: row.get("request_payload"),
        response_payload: row.get("response_payload"),
        error_code: row.get("error_code"),
        error_message: row.get("error_message"),
        execution_time_ms: row.get("execution_time_ms"),
        idempotency_key: row.get("idempotency_key"),
        is_deleted: row.get("is_deleted"),
    }
}
