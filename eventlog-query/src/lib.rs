//! Paginated query service over the event store: correlation, trace,
//! account, batch, and full-text/substring search.
//!
//! Every query here filters `is_deleted = FALSE`
//! and builds its bound parameters through `sqlx`, never by interpolating
//! caller-supplied strings into SQL text.

pub mod account;
pub mod batch;
pub mod correlation;
pub mod error;
pub mod row;
pub mod search;
pub mod trace;

pub use account::{get_account_events, get_account_timeline_summary};
pub use batch::{get_batch_events, get_batch_summary};
pub use correlation::get_correlation_events;
pub use error::QueryError;
pub use search::search_events;
pub use trace::get_trace_events;
