//! Server-side event store: schema, migrations, and transactional
//! idempotent insert.

pub mod correlation_store;
pub mod error;
pub mod event_store;
pub mod migration;
pub mod pool;
pub mod process_definition_store;
pub mod schema;

pub use correlation_store::CorrelationLinkStore;
pub use error::StoreError;
pub use event_store::{BatchInsertOutcome, EventStore};
pub use migration::migrate;
pub use pool::PoolConfig;
pub use process_definition_store::ProcessDefinitionStore;
