use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::{Event, EventStatus};

/// Response for `GET /v1/events/correlation/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationEventsResponse {
    pub events: Vec<Event>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    pub is_linked: bool,
}

/// Response for `GET /v1/events/trace/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEventsResponse {
    pub events: Vec<Event>,
    pub systems_involved: Vec<String>,
    pub total_duration_ms: i64,
}

/// Query-string filters accepted by `GET /v1/events/account/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountEventsFilter {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub process_name: Option<String>,
    pub event_status: Option<EventStatus>,
    #[serde(default)]
    pub include_linked: bool,
}

/// Response for `GET /v1/events/account/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountEventsResponse {
    pub events: Vec<Event>,
    pub total_count: i64,
    pub page: u32,
    pub page_size: u32,
    pub has_more: bool,
}

/// Per-batch aggregate counts returned alongside a page of batch events
///.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchStats {
    pub unique_correlation_ids: i64,
    pub success_count: i64,
    pub failure_count: i64,
    pub total_count: i64,
}

/// Response for `GET /v1/events/batch/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchEventsResponse {
    pub events: Vec<Event>,
    pub total_count: i64,
    pub page: u32,
    pub page_size: u32,
    pub has_more: bool,
    pub stats: BatchStats,
}

/// Response for `GET /v1/events/batch/{id}/summary`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummaryResponse {
    pub total_processes: i64,
    pub completed: i64,
    pub failed: i64,
    pub in_progress: i64,
    pub correlation_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub earliest_event_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_event_time: Option<DateTime<Utc>>,
}

/// Query-string filters accepted by `GET /v1/events/search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchFilter {
    pub query: String,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Response for `GET /v1/events/search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchEventsResponse {
    pub events: Vec<Event>,
    pub total_count: i64,
    pub page: u32,
    pub page_size: u32,
    pub has_more: bool,
}
