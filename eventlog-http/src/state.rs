use sqlx::PgPool;

use eventlog_store::{CorrelationLinkStore, EventStore};

/// Shared handler state: the pool backs both the transactional store and
/// the read-only query functions, which take `&PgPool` directly.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub event_store: EventStore,
    pub correlation_links: CorrelationLinkStore,
    pub fulltext_enabled: bool,
}

impl AppState {
    pub fn new(pool: PgPool, fulltext_enabled: bool) -> Self {
        Self {
            event_store: EventStore::new(pool.clone()),
            correlation_links: CorrelationLinkStore::new(pool.clone()),
            pool,
            fulltext_enabled,
        }
    }
}
