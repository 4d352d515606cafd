//! HTTP API server for the event-log ingestion and query platform: request
//! validation, routing, and storage-error-to-status-code mapping over the
//! `/v1` surface, terminating directly on `eventlog-store`/`eventlog-query`.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
