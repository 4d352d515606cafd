//! Token Provider capability: a one-method trait (`get_token`) with a cache
//! plus buffer-before-expiry fetch, so callers never pay a token round trip
//! on every request.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::config::OAuthConfig;

/// `get_token() -> string`, cached + refreshed on a buffer before expiry.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn get_token(&self) -> Result<Option<String>>;
}

/// Used when no OAuth configuration is present; requests go out unauthenticated.
pub struct NoopTokenProvider;

#[async_trait]
impl TokenProvider for NoopTokenProvider {
    async fn get_token(&self) -> Result<Option<String>> {
        Ok(None)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: u64,
}

/// OAuth2 client-credentials provider. Fetches from `config.token_url`,
/// caches the access token until `expires_in - buffer_seconds` has elapsed.
pub struct OAuthTokenProvider {
    config: OAuthConfig,
    client: reqwest::Client,
    cached: Arc<Mutex<Option<CachedToken>>>,
}

impl OAuthTokenProvider {
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            cached: Arc::new(Mutex::new(None)),
        }
    }

    async fn fetch(&self) -> Result<CachedToken> {
        let mut params = vec![
            ("grant_type", "client_credentials"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];
        if let Some(audience) = &self.config.audience {
            params.push(("audience", audience.as_str()));
        }

        let response = self
            .client
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await
            .context("fetching OAuth token")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("token request failed with status {status}: {body}");
        }

        let parsed: TokenResponse = response.json().await.context("parsing token response")?;
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before epoch")
            .as_secs();
        let expires_in = parsed.expires_in.saturating_sub(self.config.buffer_seconds);

        Ok(CachedToken {
            access_token: parsed.access_token,
            expires_at: now + expires_in,
        })
    }
}

#[async_trait]
impl TokenProvider for OAuthTokenProvider {
    async fn get_token(&self) -> Result<Option<String>> {
        {
            let cached = self.cached.lock().await;
            if let Some(token) = cached.as_ref() {
                let now = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .expect("system clock before epoch")
                    .as_secs();
                if token.expires_at > now {
                    return Ok(Some(token.access_token.clone()));
                }
            }
        }

        let fresh = self.fetch().await?;
        let access_token = fresh.access_token.clone();
        *self.cached.lock().await = Some(fresh);
        Ok(Some(access_token))
    }
}
