//! Producer SDK for the event-log platform: a bounded async ingestion
//! pipeline with retry, circuit breaker and spillover, a typed synchronous
//! client, and the `ProcessLogger` façade — a background sender plus a thin
//! synchronous client, both built over one HTTP transport.

pub mod async_logger;
pub mod circuit_breaker;
pub mod config;
pub mod error;
pub mod event_client;
pub mod process_logger;
pub mod retry;
pub mod spill;
pub mod token_provider;
pub mod transport;

pub use async_logger::{AsyncLogger, LossReason, Metrics};
pub use config::{LoggerConfig, OAuthConfig};
pub use error::ClientError;
pub use event_client::EventClient;
pub use process_logger::ProcessLogger;
pub use spill::{FileSpillSink, SpillSink};
pub use token_provider::{NoopTokenProvider, OAuthTokenProvider, TokenProvider};
pub use transport::HttpTransport;
