use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::Event;

/// `{index, error}` entry for a row that failed per-row insertion within an
/// otherwise-successful batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemError {
    pub index: usize,
    pub error: String,
}

/// Response body shared by `POST /v1/events` and `POST /v1/events/batch`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InsertBatchResponse {
    /// One entry per input event, in input order, including echoed ids for
    /// idempotency hits. A failed row's slot is left absent rather than
    /// guessed at — see `errors` for which indices failed.
    pub execution_ids: Vec<Option<Uuid>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ItemError>,
}

/// Request body for `POST /v1/events/batch`, which additionally fixes a
/// `batch_id` shared by every event in the submission.
#[derive(Debug, Clone, Deserialize)]
pub struct InsertExplicitBatchRequest {
    pub batch_id: String,
    pub events: Vec<Event>,
}

/// Response body for `POST /v1/events/batch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertExplicitBatchResponse {
    pub batch_id: String,
    pub execution_ids: Vec<Option<Uuid>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ItemError>,
    pub total_inserted: usize,
    pub correlation_ids: Vec<String>,
}

/// Request body accepted by `POST /v1/events`: either a single event or an
/// array of events.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum InsertEventsRequest {
    Single(Event),
    Many(Vec<Event>),
}

impl InsertEventsRequest {
    pub fn into_vec(self) -> Vec<Event> {
        match self {
            InsertEventsRequest::Single(event) => vec![event],
            InsertEventsRequest::Many(events) => events,
        }
    }
}
