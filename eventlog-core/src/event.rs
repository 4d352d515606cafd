use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One observable occurrence in a business process.
///
/// Every field other than `is_deleted` is immutable once the event has been
/// accepted by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Assigned by the server on insert. Absent on events a producer is
    /// still constructing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_id: Option<Uuid>,

    pub correlation_id: String,
    pub trace_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub span_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub span_links: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,

    pub application_id: String,
    pub originating_system: String,
    pub target_system: String,

    pub process_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_sequence: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_name: Option<String>,

    pub event_type: EventType,
    pub event_status: EventStatus,

    #[serde(default)]
    pub identifiers: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,

    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,

    pub event_timestamp: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_method: Option<HttpMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_payload: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_payload: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,

    #[serde(default)]
    pub is_deleted: bool,
}

/// Coarse-grained lifecycle position of an event within a process instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    ProcessStart,
    Step,
    ProcessEnd,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    Success,
    Failure,
    InProgress,
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl Event {
    /// True for events whose payload/narrative fields may legitimately carry
    /// sensitive data and should not be logged at `info` level by callers.
    pub fn has_sensitive_payload(&self) -> bool {
        self.request_payload.is_some() || self.response_payload.is_some()
    }
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::ProcessStart => "PROCESS_START",
            EventType::Step => "STEP",
            EventType::ProcessEnd => "PROCESS_END",
            EventType::Error => "ERROR",
        }
    }
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Success => "SUCCESS",
            EventStatus::Failure => "FAILURE",
            EventStatus::InProgress => "IN_PROGRESS",
            EventStatus::Skipped => "SKIPPED",
        }
    }
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl std::str::FromStr for EventStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUCCESS" => Ok(EventStatus::Success),
            "FAILURE" => Ok(EventStatus::Failure),
            "IN_PROGRESS" => Ok(EventStatus::InProgress),
            "SKIPPED" => Ok(EventStatus::Skipped),
            _ => Err(()),
        }
    }
}

impl std::str::FromStr for EventType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PROCESS_START" => Ok(EventType::ProcessStart),
            "STEP" => Ok(EventType::Step),
            "PROCESS_END" => Ok(EventType::ProcessEnd),
            "ERROR" => Ok(EventType::Error),
            _ => Err(()),
        }
    }
}

impl std::str::FromStr for HttpMethod {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            "PATCH" => Ok(HttpMethod::Patch),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            _ => Err(()),
        }
    }
}
