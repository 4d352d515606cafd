use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-account materialized aggregate. Read-only from the core's
/// perspective — how it is kept up to date is out of scope for this crate
///: a query for an account with no summary row yet is a
/// legitimate 404, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountTimelineSummary {
    pub account_id: String,
    pub first_event_time: DateTime<Utc>,
    pub last_event_time: DateTime<Utc>,
    pub total_events: i64,
    pub systems_touched: Vec<String>,
    pub recent_correlation_ids: Vec<String>,
}
