//! Server CLI/environment configuration: a `clap::Parser` struct covering
//! the listen address plus the database and pool knobs.

use std::net::SocketAddr;

use clap::Parser;
use eventlog_store::PoolConfig;

#[derive(Parser, Debug)]
#[clap(name = "eventlog-http-srv")]
#[clap(about = "Event-log ingestion and query platform HTTP API", version, author)]
pub struct Cli {
    #[clap(long, env = "LISTEN_ENDPOINT_HTTP", default_value = "0.0.0.0:3000")]
    pub listen_endpoint_http: SocketAddr,

    #[clap(long, env = "DATABASE_URL")]
    pub database_url: String,

    #[clap(long, env = "DB_POOL_MAX", default_value_t = 10)]
    pub db_pool_max: u32,

    #[clap(long, env = "DB_POOL_MIN", default_value_t = 0)]
    pub db_pool_min: u32,

    #[clap(long, env = "DB_IDLE_TIMEOUT_MS", default_value_t = 30_000)]
    pub db_idle_timeout_ms: u64,

    #[clap(long, env = "DB_ACQUIRE_TIMEOUT_MS", default_value_t = 15_000)]
    pub db_acquire_timeout_ms: u64,

    #[clap(long, env = "DB_REQUEST_TIMEOUT_MS", default_value_t = 30_000)]
    pub db_request_timeout_ms: u64,

    #[clap(long, env = "FULLTEXT_ENABLED", default_value_t = false)]
    pub fulltext_enabled: bool,
}

impl Cli {
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            max_connections: self.db_pool_max,
            min_connections: self.db_pool_min,
            idle_timeout_ms: self.db_idle_timeout_ms,
            acquire_timeout_ms: self.db_acquire_timeout_ms,
            request_timeout_ms: self.db_request_timeout_ms,
            fulltext_enabled: self.fulltext_enabled,
        }
    }
}
