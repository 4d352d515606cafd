use std::sync::Arc;

use eventlog_core::batch::InsertBatchResponse;
use eventlog_core::event::{EventStatus, EventType};
use eventlog_core::Event;
use eventlog_sink::{ClientError, EventClient, NoopTokenProvider};
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
async fn insert_events_returns_execution_ids() {
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

    let client = EventClient::new(server.uri(), Arc::new(NoopTokenProvider));
    let response = client.insert_events(&[sample_event()]).await.unwrap();
    assert_eq!(response.execution_ids, vec![Some(execution_id)]);
}

#[tokio::test]
async fn terminal_4xx_surfaces_as_typed_client_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/events"))
        .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"error_code":"validation_failed"}"#))
        .mount(&server)
        .await;

    let client = EventClient::new(server.uri(), Arc::new(NoopTokenProvider));
    let err = client.insert_events(&[sample_event()]).await.unwrap_err();
    match err {
        ClientError::Server { status_code, error_code, .. } => {
            assert_eq!(status_code, 400);
            assert_eq!(error_code.as_deref(), Some("validation_failed"));
        }
        other => panic!("expected typed server error, got {other:?}"),
    }
}

#[tokio::test]
async fn transient_server_error_is_retried_until_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/events"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/events"))
        .respond_with(ResponseTemplate::new(201).set_body_json(InsertBatchResponse::default()))
        .mount(&server)
        .await;

    let client = EventClient::new(server.uri(), Arc::new(NoopTokenProvider));
    let response = client.insert_events(&[sample_event()]).await.unwrap();
    assert!(response.execution_ids.is_empty());
}
