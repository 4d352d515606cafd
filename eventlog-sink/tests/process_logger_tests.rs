use std::sync::Arc;

use eventlog_core::batch::InsertBatchResponse;
use eventlog_core::event::{EventStatus, EventType};
use eventlog_sink::config::LoggerConfig;
use eventlog_sink::{AsyncLogger, HttpTransport, NoopTokenProvider, ProcessLogger};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate, Request};

/// Captures the JSON bodies posted to `/v1/events` so assertions can inspect
/// exactly what the façade sent, without depending on `AsyncLogger`'s
/// internal batching to have flushed by a fixed point in time.
async fn wait_for_request(server: &MockServer, expected_count: usize) -> Vec<serde_json::Value> {
    for _ in 0..50 {
        let requests = server.received_requests().await.unwrap_or_default();
        if requests.len() >= expected_count {
            return requests
                .iter()
                .flat_map(|r: &Request| {
                    let body: serde_json::Value = serde_json::from_slice(&r.body).unwrap();
                    match body {
                        serde_json::Value::Array(items) => items,
                        other => vec![other],
                    }
                })
                .collect();
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    panic!("timed out waiting for {expected_count} request(s)");
}

#[tokio::test]
async fn persistent_fields_survive_across_emits_and_one_shots_clear() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/events"))
        .respond_with(ResponseTemplate::new(201).set_body_json(InsertBatchResponse::default()))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(server.uri(), Arc::new(NoopTokenProvider));
    let config = LoggerConfig {
        batch_size: 1,
        max_batch_wait_ms: 10,
        ..Default::default()
    };
    let logger = AsyncLogger::new(config, transport, None);

    let process = ProcessLogger::new(logger, "onboarding", "app-1", "svc-a", "svc-b");
    process.set_correlation_id("corr-A");
    process.set_trace_id("trace-A");
    process.add_identifier("employee_id", "E-1");

    process.with_http("/v1/widgets", eventlog_core::event::HttpMethod::Post, 200);
    assert!(process.process_start("began", None).await);
    assert!(
        process
            .log_step(1, "validate", EventStatus::Success, "validated", None)
            .await
    );

    let events = wait_for_request(&server, 2).await;
    assert_eq!(events.len(), 2);

    assert_eq!(events[0]["correlation_id"], "corr-A");
    assert_eq!(events[0]["trace_id"], "trace-A");
    assert_eq!(events[0]["identifiers"]["employee_id"], "E-1");
    assert_eq!(events[0]["event_type"], "PROCESS_START");
    assert_eq!(events[0]["endpoint"], "/v1/widgets");

    // The http one-shot fields were set before process_start; they must not
    // leak onto the next emit.
    assert_eq!(events[1]["correlation_id"], "corr-A");
    assert!(events[1].get("endpoint").is_none());
    assert_eq!(events[1]["event_type"], "STEP");
}

#[tokio::test]
async fn each_emit_gets_a_fresh_span_id_parented_on_the_previous() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/events"))
        .respond_with(ResponseTemplate::new(201).set_body_json(InsertBatchResponse::default()))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(server.uri(), Arc::new(NoopTokenProvider));
    let config = LoggerConfig {
        batch_size: 1,
        max_batch_wait_ms: 10,
        ..Default::default()
    };
    let logger = AsyncLogger::new(config, transport, None);
    let process = ProcessLogger::new(logger, "onboarding", "app-1", "svc-a", "svc-b");
    process.set_correlation_id("corr-B");

    process.process_start("began", None).await;
    process
        .log_step(1, "validate", EventStatus::Success, "validated", None)
        .await;

    let events = wait_for_request(&server, 2).await;
    let first_span = events[0]["span_id"].as_str().unwrap().to_string();
    let second_parent = events[1]["parent_span_id"].as_str().unwrap().to_string();
    assert_eq!(first_span, second_parent);
    assert_ne!(events[0]["span_id"], events[1]["span_id"]);
}

#[tokio::test]
async fn auto_generated_correlation_and_trace_ids_stay_stable_across_a_process() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/events"))
        .respond_with(ResponseTemplate::new(201).set_body_json(InsertBatchResponse::default()))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(server.uri(), Arc::new(NoopTokenProvider));
    let config = LoggerConfig {
        batch_size: 1,
        max_batch_wait_ms: 10,
        ..Default::default()
    };
    let logger = AsyncLogger::new(config, transport, None);
    // No set_correlation_id/set_trace_id: both must be minted once and
    // reused, not regenerated on every emit.
    let process = ProcessLogger::new(logger, "onboarding", "app-1", "svc-a", "svc-b");

    process.process_start("began", None).await;
    process
        .log_step(1, "validate", EventStatus::Success, "validated", None)
        .await;
    process
        .process_end(2, EventStatus::Success, "done", None, Some(42))
        .await;

    let events = wait_for_request(&server, 3).await;
    let correlation_id = events[0]["correlation_id"].as_str().unwrap().to_string();
    let trace_id = events[0]["trace_id"].as_str().unwrap().to_string();
    for event in &events[1..] {
        assert_eq!(event["correlation_id"].as_str().unwrap(), correlation_id);
        assert_eq!(event["trace_id"].as_str().unwrap(), trace_id);
    }
}
