//! Domain and wire types shared by the producer SDK (`eventlog-sink`) and
//! the server (`eventlog-store`, `eventlog-query`, `eventlog-http`).
//!
//! Nothing in this crate talks to a network or a database — it is pure data
//! plus the validation rules both sides must agree on.

pub mod account_summary;
pub mod batch;
pub mod correlation;
pub mod error;
pub mod event;
pub mod ids;
pub mod pagination;
pub mod process_definition;
pub mod query;
pub mod validation;

pub use account_summary::AccountTimelineSummary;
pub use correlation::{CorrelationLink, CreateCorrelationLinkRequest};
pub use error::EventLogError;
pub use event::{Event, EventStatus, EventType, HttpMethod};
pub use pagination::{Page, PageRequest};
pub use process_definition::ProcessDefinition;
pub use validation::{validate_event, FieldError};
