//! Producer-side configuration. Plain struct with a `Default` impl and a
//! `from_env()` constructor for the queue, retry, circuit-breaker and
//! spillover knobs, plus an OAuth client-credentials config that enforces
//! its three fields all-or-nothing.

use std::path::PathBuf;

use anyhow::{bail, Result};

/// Knobs for [`crate::async_logger::AsyncLogger`]: queue, retry,
/// circuit-breaker and spillover tuning, each with an environment variable
/// and a documented default.
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub queue_capacity: usize,
    pub sender_threads: usize,
    pub batch_size: usize,
    pub max_batch_wait_ms: u64,
    pub max_retries: u32,
    pub base_retry_delay_ms: u64,
    pub max_retry_delay_ms: u64,
    pub circuit_breaker_threshold: u32,
    pub circuit_breaker_reset_ms: u64,
    pub spillover_path: Option<PathBuf>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 10_000,
            sender_threads: 1,
            batch_size: 50,
            max_batch_wait_ms: 100,
            max_retries: 3,
            base_retry_delay_ms: 1_000,
            max_retry_delay_ms: 30_000,
            circuit_breaker_threshold: 5,
            circuit_breaker_reset_ms: 30_000,
            spillover_path: None,
        }
    }
}

impl LoggerConfig {
    /// Loads from `EVENTLOG_QUEUE_CAPACITY`/`EVENTLOG_SENDER_THREADS`/
    /// `EVENTLOG_BATCH_SIZE`/`EVENTLOG_MAX_BATCH_WAIT_MS`/
    /// `EVENTLOG_MAX_RETRIES`/`EVENTLOG_BASE_RETRY_DELAY_MS`/
    /// `EVENTLOG_MAX_RETRY_DELAY_MS`/`EVENTLOG_CIRCUIT_BREAKER_THRESHOLD`/
    /// `EVENTLOG_CIRCUIT_BREAKER_RESET_MS`/`EVENTLOG_SPILLOVER_PATH`, falling
    /// back to the documented defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            queue_capacity: env_usize("EVENTLOG_QUEUE_CAPACITY", defaults.queue_capacity),
            sender_threads: env_usize("EVENTLOG_SENDER_THREADS", defaults.sender_threads).max(1),
            batch_size: env_usize("EVENTLOG_BATCH_SIZE", defaults.batch_size),
            max_batch_wait_ms: env_u64("EVENTLOG_MAX_BATCH_WAIT_MS", defaults.max_batch_wait_ms),
            max_retries: env_u32("EVENTLOG_MAX_RETRIES", defaults.max_retries),
            base_retry_delay_ms: env_u64(
                "EVENTLOG_BASE_RETRY_DELAY_MS",
                defaults.base_retry_delay_ms,
            ),
            max_retry_delay_ms: env_u64(
                "EVENTLOG_MAX_RETRY_DELAY_MS",
                defaults.max_retry_delay_ms,
            ),
            circuit_breaker_threshold: env_u32(
                "EVENTLOG_CIRCUIT_BREAKER_THRESHOLD",
                defaults.circuit_breaker_threshold,
            ),
            circuit_breaker_reset_ms: env_u64(
                "EVENTLOG_CIRCUIT_BREAKER_RESET_MS",
                defaults.circuit_breaker_reset_ms,
            ),
            spillover_path: std::env::var("EVENTLOG_SPILLOVER_PATH").ok().map(PathBuf::from),
        }
    }
}

fn env_usize(name: &str, default: usize) -> usize {
    std::env::var(name).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
fn env_u32(name: &str, default: u32) -> u32 {
    std::env::var(name).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// OAuth2 client-credentials configuration for
/// [`crate::token_provider::OAuthTokenProvider`]. Partially-specified
/// configuration is rejected: any of `{token_url, client_id, client_secret}`
/// being set requires all three.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub audience: Option<String>,
    pub buffer_seconds: u64,
}

impl OAuthConfig {
    /// Reads `EVENTLOG_OAUTH_TOKEN_URL`/`_CLIENT_ID`/`_CLIENT_SECRET`.
    /// Returns `Ok(None)` when none are set (OAuth is simply not
    /// configured); returns an error when only some are set.
    pub fn from_env() -> Result<Option<Self>> {
        let token_url = std::env::var("EVENTLOG_OAUTH_TOKEN_URL").ok();
        let client_id = std::env::var("EVENTLOG_OAUTH_CLIENT_ID").ok();
        let client_secret = std::env::var("EVENTLOG_OAUTH_CLIENT_SECRET").ok();

        let present = [&token_url, &client_id, &client_secret]
            .iter()
            .filter(|v| v.is_some())
            .count();

        if present == 0 {
            return Ok(None);
        }
        if present != 3 {
            bail!(
                "partial OAuth configuration: token_url, client_id and client_secret must all be \
                 set together, or none of them"
            );
        }

        let buffer_seconds = std::env::var("EVENTLOG_OAUTH_TOKEN_BUFFER_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(180);

        Ok(Some(Self {
            token_url: token_url.unwrap(),
            client_id: client_id.unwrap(),
            client_secret: client_secret.unwrap(),
            audience: std::env::var("EVENTLOG_OAUTH_AUDIENCE").ok(),
            buffer_seconds,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_oauth_env() {
        for key in [
            "EVENTLOG_OAUTH_TOKEN_URL",
            "EVENTLOG_OAUTH_CLIENT_ID",
            "EVENTLOG_OAUTH_CLIENT_SECRET",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn defaults_match_documented_values() {
        let c = LoggerConfig::default();
        assert_eq!(c.queue_capacity, 10_000);
        assert_eq!(c.sender_threads, 1);
        assert_eq!(c.batch_size, 50);
        assert_eq!(c.max_batch_wait_ms, 100);
        assert_eq!(c.max_retries, 3);
        assert_eq!(c.base_retry_delay_ms, 1_000);
        assert_eq!(c.max_retry_delay_ms, 30_000);
        assert_eq!(c.circuit_breaker_threshold, 5);
        assert_eq!(c.circuit_breaker_reset_ms, 30_000);
        assert!(c.spillover_path.is_none());
    }

    #[test]
    fn oauth_config_absent_is_fine() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_oauth_env();
        assert!(OAuthConfig::from_env().unwrap().is_none());
    }

    #[test]
    fn oauth_config_partial_is_rejected() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_oauth_env();
        std::env::set_var("EVENTLOG_OAUTH_TOKEN_URL", "https://example.com/token");
        let result = OAuthConfig::from_env();
        clear_oauth_env();
        assert!(result.is_err());
    }

    #[test]
    fn oauth_config_complete_is_accepted() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_oauth_env();
        std::env::set_var("EVENTLOG_OAUTH_TOKEN_URL", "https://example.com/token");
        std::env::set_var("EVENTLOG_OAUTH_CLIENT_ID", "id");
        std::env::set_var("EVENTLOG_OAUTH_CLIENT_SECRET", "secret");
        let config = OAuthConfig::from_env().unwrap().unwrap();
        clear_oauth_env();
        assert_eq!(config.token_url, "https://example.com/token");
        assert_eq!(config.buffer_seconds, 180);
    }
}
