//! Postgres-backed integration tests. Require a live database reachable via
//! `DATABASE_URL`; marked `#[ignore]` since CI does not provision one. Run
//! with `cargo test -- --ignored` against a real Postgres instance.

use chrono::Utc;
use eventlog_core::event::{Event, EventStatus, EventType};
use eventlog_store::{EventStore, PoolConfig};
use sqlx::PgPool;

async fn connect() -> PgPool {
    let db_uri = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for this test");
    let pool = eventlog_store::pool::connect(&db_uri, &PoolConfig::default())
        .await
        .expect("connect to test database");
    eventlog_store::migration::migrate(&pool)
        .await
        .expect("migrate test database");
    pool
}

fn sample_event(correlation_id: &str, idempotency_key: Option<&str>) -> Event {
    Event {
        execution_id: None,
        correlation_id: correlation_id.to_string(),
        trace_id: "trace-1".to_string(),
        span_id: Some("abcd1234abcd1234".to_string()),
        parent_span_id: None,
        span_links: None,
        account_id: Some("acct-1".to_string()),
        batch_id: None,
        application_id: "app-1".to_string(),
        originating_system: "origin".to_string(),
        target_system: "target".to_string(),
        process_name: "onboarding".to_string(),
        step_sequence: Some(0),
        step_name: Some("start".to_string()),
        event_type: EventType::ProcessStart,
        event_status: EventStatus::InProgress,
        identifiers: Default::default(),
        metadata: None,
        summary: "process started".to_string(),
        result: None,
        event_timestamp: Utc::now(),
        endpoint: None,
        http_method: None,
        http_status_code: None,
        request_payload: None,
        response_payload: None,
        error_code: None,
        error_message: None,
        execution_time_ms: None,
        idempotency_key: idempotency_key.map(|s| s.to_string()),
        is_deleted: false,
    }
}

#[tokio::test]
#[ignore]
async fn insert_batch_dedupes_known_idempotency_keys() {
    let pool = connect().await;
    let store = EventStore::new(pool);

    let key = format!("idem-{}", uuid::Uuid::new_v4());
    let first = sample_event("corr-1", Some(&key));
    let outcome_one = store.insert_batch(&[first]).await.unwrap();
    let id_one = outcome_one.execution_ids[0].unwrap();

    let second = sample_event("corr-1", Some(&key));
    let outcome_two = store.insert_batch(&[second]).await.unwrap();
    let id_two = outcome_two.execution_ids[0].unwrap();

    assert_eq!(id_one, id_two, "repeated idempotency key must echo the same execution_id");
}

#[tokio::test]
#[ignore]
async fn insert_batch_partial_failure_does_not_sink_good_rows() {
    let pool = connect().await;
    let store = EventStore::new(pool);

    let mut bad = sample_event("corr-2", None);
    bad.http_method = None;
    bad.endpoint = Some("x".repeat(3000)); // exceeds VARCHAR(2048)

    let good = sample_event("corr-3", None);

    let outcome = store.insert_batch(&[bad, good]).await.unwrap();
    assert!(outcome.execution_ids[1].is_some(), "the valid row must still be inserted");
    assert!(!outcome.errors.is_empty(), "the oversized row must be reported as an error");
}
