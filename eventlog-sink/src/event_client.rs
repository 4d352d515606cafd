//! Event Client: typed synchronous single/batch insert and the read
//! queries, each surfacing errors as [`ClientError`]. Request-level
//! retry-on-5xx/429 uses `tokio-retry2::Retry::spawn`.

use std::sync::Arc;
use std::time::Duration;

use eventlog_core::batch::{InsertBatchResponse, InsertExplicitBatchRequest, InsertExplicitBatchResponse};
use eventlog_core::query::{
    AccountEventsFilter, AccountEventsResponse, BatchEventsResponse, BatchSummaryResponse,
    CorrelationEventsResponse, SearchEventsResponse, SearchFilter, TraceEventsResponse,
};
use eventlog_core::Event;
use reqwest::StatusCode;
use tokio_retry2::strategy::{jitter, ExponentialBackoff};
use tokio_retry2::{Retry, RetryError};

use crate::error::ClientError;
use crate::token_provider::TokenProvider;

const RETRY_ATTEMPTS: usize = 3;

pub struct EventClient {
    client: reqwest::Client,
    base_url: String,
    token_provider: Arc<dyn TokenProvider>,
}

impl EventClient {
    pub fn new(base_url: impl Into<String>, token_provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("building reqwest client with static configuration"),
            base_url: base_url.into(),
            token_provider,
        }
    }

    async fn bearer(&self) -> Result<Option<String>, ClientError> {
        self.token_provider
            .get_token()
            .await
            .map_err(ClientError::Other)
    }

    fn retry_strategy() -> impl Iterator<Item = Duration> {
        ExponentialBackoff::from_millis(500).map(jitter).take(RETRY_ATTEMPTS)
    }

    async fn execute_json<T: serde::de::DeserializeOwned>(
        &self,
        build: impl Fn() -> reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let token = self.bearer().await?;
        Retry::spawn(Self::retry_strategy(), || async {
            let mut builder = build();
            if let Some(token) = &token {
                builder = builder.bearer_auth(token);
            }
            let response = builder
                .send()
                .await
                .map_err(|e| RetryError::transient(ClientError::Transport(e)))?;

            let status = response.status();
            if status.is_success() {
                response
                    .json::<T>()
                    .await
                    .map_err(|e| RetryError::permanent(ClientError::Transport(e)))
            } else if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                Err(RetryError::transient(server_error(status, response.text().await.ok())))
            } else {
                let body = response.text().await.unwrap_or_default();
                Err(RetryError::permanent(server_error(status, Some(body))))
            }
        })
        .await
    }

    pub async fn insert_events(&self, events: &[Event]) -> Result<InsertBatchResponse, ClientError> {
        let url = format!("{}/v1/events", self.base_url);
        let client = self.client.clone();
        let body = events.to_vec();
        self.execute_json(move || client.post(&url).json(&body)).await
    }

    pub async fn insert_explicit_batch(
        &self,
        batch_id: &str,
        events: Vec<Event>,
    ) -> Result<InsertExplicitBatchResponse, ClientError> {
        let url = format!("{}/v1/events/batch", self.base_url);
        let client = self.client.clone();
        let request = InsertExplicitBatchRequest {
            batch_id: batch_id.to_string(),
            events,
        };
        self.execute_json(move || client.post(&url).json(&request)).await
    }

    pub async fn get_correlation_events(&self, correlation_id: &str) -> Result<CorrelationEventsResponse, ClientError> {
        let url = format!("{}/v1/events/correlation/{correlation_id}", self.base_url);
        let client = self.client.clone();
        self.execute_json(move || client.get(&url)).await
    }

    pub async fn get_trace_events(&self, trace_id: &str) -> Result<TraceEventsResponse, ClientError> {
        let url = format!("{}/v1/events/trace/{trace_id}", self.base_url);
        let client = self.client.clone();
        self.execute_json(move || client.get(&url)).await
    }

    pub async fn get_account_events(
        &self,
        account_id: &str,
        filter: &AccountEventsFilter,
    ) -> Result<AccountEventsResponse, ClientError> {
        let url = format!("{}/v1/events/account/{account_id}", self.base_url);
        let client = self.client.clone();
        let filter = filter.clone();
        self.execute_json(move || client.get(&url).query(&filter)).await
    }

    pub async fn get_batch_events(&self, batch_id: &str, page: u32, page_size: u32) -> Result<BatchEventsResponse, ClientError> {
        let url = format!("{}/v1/events/batch/{batch_id}", self.base_url);
        let client = self.client.clone();
        self.execute_json(move || client.get(&url).query(&[("page", page), ("page_size", page_size)]))
            .await
    }

    pub async fn get_batch_summary(&self, batch_id: &str) -> Result<BatchSummaryResponse, ClientError> {
        let url = format!("{}/v1/events/batch/{batch_id}/summary", self.base_url);
        let client = self.client.clone();
        self.execute_json(move || client.get(&url)).await
    }

    pub async fn search_events(&self, filter: &SearchFilter) -> Result<SearchEventsResponse, ClientError> {
        let url = format!("{}/v1/events/search", self.base_url);
        let client = self.client.clone();
        let filter = filter.clone();
        self.execute_json(move || client.get(&url).query(&filter)).await
    }
}

fn server_error(status: StatusCode, body: Option<String>) -> ClientError {
    let message = body.unwrap_or_default();
    let error_code = serde_json::from_str::<serde_json::Value>(&message)
        .ok()
        .and_then(|v| v.get("error_code").and_then(|c| c.as_str()).map(str::to_string));
    ClientError::Server {
        status_code: status.as_u16(),
        error_code,
        message,
    }
}
