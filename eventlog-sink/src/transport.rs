//! HTTP Transport: stateless request/response
//! abstraction with timeouts and retry-on-5xx/429, classifying responses so
//! the caller (the async logger's worker loop) can apply its retry/spill
//! state-machine transitions without reaching into `reqwest` itself.

use std::sync::Arc;
use std::time::Duration;

use eventlog_core::{batch::InsertBatchResponse, Event};
use reqwest::StatusCode;

use crate::token_provider::TokenProvider;

/// What the caller should do with a batch send result.
pub enum SendOutcome {
    /// 2xx; body parsed into per-item results.
    Success(InsertBatchResponse),
    /// Connection error, timeout, 5xx, or 429 — retry the whole batch as
    /// one unit rather than retrying individual rows.
    Retryable(String),
    /// Other 4xx, or a second token-refresh failure within this attempt —
    /// spill the whole batch and count it failed.
    Terminal(String),
}

pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    token_provider: Arc<dyn TokenProvider>,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, token_provider: Arc<dyn TokenProvider>) -> Self {
        let client = reqwest::Client::builder()
            .pool_idle_timeout(Some(Duration::from_secs(30)))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("building reqwest client with static configuration");
        Self {
            client,
            base_url: base_url.into(),
            token_provider,
        }
    }

    async fn authorized_post(&self, url: &str, body: &[Event]) -> Result<reqwest::Request, SendOutcome> {
        let mut request = self
            .client
            .post(url)
            .json(body)
            .build()
            .map_err(|e| SendOutcome::Terminal(format!("building request: {e}")))?;

        // Token refresh failures are retryable once within this attempt;
        // a second failure is terminal for the attempt.
        let token = match self.token_provider.get_token().await {
            Ok(token) => token,
            Err(first_err) => match self.token_provider.get_token().await {
                Ok(token) => token,
                Err(second_err) => {
                    return Err(SendOutcome::Terminal(format!(
                        "token refresh failed twice: {first_err} / {second_err}"
                    )))
                }
            },
        };
        if let Some(token) = token {
            let value = reqwest::header::HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| SendOutcome::Terminal(format!("invalid token header: {e}")))?;
            request.headers_mut().insert(reqwest::header::AUTHORIZATION, value);
        }
        Ok(request)
    }

    /// Posts `events` to `/v1/events` (the array-insert endpoint) and
    /// classifies the result.
    #[tracing::instrument(skip(self, events), fields(batch_size = events.len()))]
    pub async fn send_batch(&self, events: &[Event]) -> SendOutcome {
        let url = format!("{}/v1/events", self.base_url);
        let request = match self.authorized_post(&url, events).await {
            Ok(request) => request,
            Err(outcome) => return outcome,
        };

        let response = match self.client.execute(request).await {
            Ok(response) => response,
            Err(e) => return SendOutcome::Retryable(format!("transport error: {e}")),
        };

        let status = response.status();
        if status.is_success() {
            match response.json::<InsertBatchResponse>().await {
                Ok(body) => SendOutcome::Success(body),
                Err(e) => SendOutcome::Retryable(format!("decoding response: {e}")),
            }
        } else if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            SendOutcome::Retryable(format!("server returned {status}"))
        } else {
            let body = response.text().await.unwrap_or_default();
            SendOutcome::Terminal(format!("server returned {status}: {body}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token_provider::NoopTokenProvider;
    use eventlog_core::event::{EventStatus, EventType};
    use std::collections::HashMap;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_event() -> Event {
        Event {
            execution_id: None,
            correlation_id: "corr-1".into(),
            trace_id: "trace-1".into(),
            span_id: None,
            parent_span_id: None,
            span_links: None,
            account_id: None,
            batch_id: None,
            application_id: "app".into(),
            originating_system: "svc-a".into(),
            target_system: "svc-b".into(),
            process_name: "onboarding".into(),
            step_sequence: None,
            step_name: None,
            event_type: EventType::Step,
            event_status: EventStatus::Success,
            identifiers: HashMap::new(),
            metadata: None,
            summary: "did a thing".into(),
            result: None,
            event_timestamp: chrono::Utc::now(),
            endpoint: None,
            http_method: None,
            http_status_code: None,
            request_payload: None,
            response_payload: None,
            error_code: None,
            error_message: None,
            execution_time_ms: None,
            idempotency_key: None,
            is_deleted: false,
        }
    }

    #[tokio::test]
    async fn success_response_parses_execution_ids() {
        let server = MockServer::start().await;
        let execution_id = uuid::Uuid::new_v4();
        Mock::given(method("POST"))
            .and(path("/v1/events"))
            .respond_with(ResponseTemplate::new(201).set_body_json(InsertBatchResponse {
                execution_ids: vec![Some(execution_id)],
                errors: vec![],
            }))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(server.uri(), Arc::new(NoopTokenProvider));
        match transport.send_batch(&[sample_event()]).await {
            SendOutcome::Success(body) => assert_eq!(body.execution_ids, vec![Some(execution_id)]),
            _ => panic!("expected success outcome"),
        }
    }

    #[tokio::test]
    async fn server_error_is_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/events"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(server.uri(), Arc::new(NoopTokenProvider));
        assert!(matches!(
            transport.send_batch(&[sample_event()]).await,
            SendOutcome::Retryable(_)
        ));
    }

    #[tokio::test]
    async fn too_many_requests_is_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/events"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(server.uri(), Arc::new(NoopTokenProvider));
        assert!(matches!(
            transport.send_batch(&[sample_event()]).await,
            SendOutcome::Retryable(_)
        ));
    }

    #[tokio::test]
    async fn other_4xx_is_terminal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/events"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(server.uri(), Arc::new(NoopTokenProvider));
        assert!(matches!(
            transport.send_batch(&[sample_event()]).await,
            SendOutcome::Terminal(_)
        ));
    }
}
