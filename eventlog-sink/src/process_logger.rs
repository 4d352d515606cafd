//! Process Logger / Template: a thin façade over
//! [`crate::async_logger::AsyncLogger`] that stamps persistent defaults and
//! one-shot per-step overrides onto outgoing events, and assigns fresh span
//! ids on every emit.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use eventlog_core::event::{EventStatus, EventType, HttpMethod};
use eventlog_core::ids::new_span_id;
use eventlog_core::Event;

use crate::async_logger::AsyncLogger;

/// Fields stamped on every emit until explicitly changed.
#[derive(Debug, Clone, Default)]
struct Persistent {
    correlation_id: Option<String>,
    trace_id: Option<String>,
    application_id: String,
    originating_system: String,
    target_system: String,
    account_id: Option<String>,
    batch_id: Option<String>,
    identifiers: HashMap<String, String>,
    metadata: Option<serde_json::Value>,
}

/// Fields stamped on the next emit only, then cleared.
#[derive(Debug, Clone, Default)]
struct OneShot {
    target_system: Option<String>,
    endpoint: Option<String>,
    http_method: Option<HttpMethod>,
    http_status_code: Option<u16>,
    execution_time_ms: Option<i64>,
    request_payload: Option<String>,
    response_payload: Option<String>,
    span_links: Option<Vec<String>>,
    error_code: Option<String>,
    error_message: Option<String>,
    idempotency_key: Option<String>,
}

struct State {
    persistent: Persistent,
    one_shot: OneShot,
    last_span_id: Option<String>,
    root_span_id: Option<String>,
}

/// Span id policy: every emit gets a fresh span id; the parent is the
/// logger's last span id unless the caller overrode it; the root
/// process-start's span id is kept for terminal-event parenting.
pub struct ProcessLogger {
    logger: Arc<AsyncLogger>,
    process_name: String,
    state: Mutex<State>,
}

impl ProcessLogger {
    pub fn new(
        logger: Arc<AsyncLogger>,
        process_name: impl Into<String>,
        application_id: impl Into<String>,
        originating_system: impl Into<String>,
        target_system: impl Into<String>,
    ) -> Self {
        Self {
            logger,
            process_name: process_name.into(),
            state: Mutex::new(State {
                persistent: Persistent {
                    application_id: application_id.into(),
                    originating_system: originating_system.into(),
                    target_system: target_system.into(),
                    ..Default::default()
                },
                one_shot: OneShot::default(),
                last_span_id: None,
                root_span_id: None,
            }),
        }
    }

    pub fn set_correlation_id(&self, correlation_id: impl Into<String>) {
        self.state.lock().unwrap().persistent.correlation_id = Some(correlation_id.into());
    }

    pub fn set_trace_id(&self, trace_id: impl Into<String>) {
        self.state.lock().unwrap().persistent.trace_id = Some(trace_id.into());
    }

    pub fn set_account_id(&self, account_id: impl Into<String>) {
        self.state.lock().unwrap().persistent.account_id = Some(account_id.into());
    }

    pub fn set_batch_id(&self, batch_id: impl Into<String>) {
        self.state.lock().unwrap().persistent.batch_id = Some(batch_id.into());
    }

    /// Adds (or overwrites) an identifier that stacks forward onto this and
    /// every subsequent emit, never retroactively.
    pub fn add_identifier(&self, key: impl Into<String>, value: impl Into<String>) {
        self.state
            .lock()
            .unwrap()
            .persistent
            .identifiers
            .insert(key.into(), value.into());
    }

    pub fn add_metadata(&self, key: &str, value: serde_json::Value) {
        let mut guard = self.state.lock().unwrap();
        let metadata = guard
            .persistent
            .metadata
            .get_or_insert_with(|| serde_json::Value::Object(Default::default()));
        if let serde_json::Value::Object(map) = metadata {
            map.insert(key.to_string(), value);
        }
    }

    /// One-shot override for the next emit's `target_system`.
    pub fn with_target_system(&self, target_system: impl Into<String>) {
        self.state.lock().unwrap().one_shot.target_system = Some(target_system.into());
    }

    pub fn with_http(&self, endpoint: impl Into<String>, method: HttpMethod, status_code: u16) {
        let mut guard = self.state.lock().unwrap();
        guard.one_shot.endpoint = Some(endpoint.into());
        guard.one_shot.http_method = Some(method);
        guard.one_shot.http_status_code = Some(status_code);
    }

    pub fn with_payloads(&self, request_payload: Option<String>, response_payload: Option<String>) {
        let mut guard = self.state.lock().unwrap();
        guard.one_shot.request_payload = request_payload;
        guard.one_shot.response_payload = response_payload;
    }

    pub fn with_execution_time_ms(&self, execution_time_ms: i64) {
        self.state.lock().unwrap().one_shot.execution_time_ms = Some(execution_time_ms);
    }

    pub fn with_idempotency_key(&self, idempotency_key: impl Into<String>) {
        self.state.lock().unwrap().one_shot.idempotency_key = Some(idempotency_key.into());
    }

    pub fn with_span_links(&self, span_links: Vec<String>) {
        self.state.lock().unwrap().one_shot.span_links = Some(span_links);
    }

    pub async fn process_start(&self, summary: impl Into<String>, result: Option<String>) -> bool {
        let event = self.build_event(EventType::ProcessStart, Some(0), None, EventStatus::InProgress, summary, result, None, None);
        {
            let mut guard = self.state.lock().unwrap();
            if guard.root_span_id.is_none() {
                guard.root_span_id = event.span_id.clone();
            }
        }
        self.logger.log(event).await
    }

    pub async fn log_step(
        &self,
        step_sequence: i32,
        step_name: impl Into<String>,
        status: EventStatus,
        summary: impl Into<String>,
        result: Option<String>,
    ) -> bool {
        let event = self.build_event(
            EventType::Step,
            Some(step_sequence),
            Some(step_name.into()),
            status,
            summary,
            result,
            None,
            None,
        );
        self.logger.log(event).await
    }

    pub async fn process_end(
        &self,
        step_sequence: i32,
        status: EventStatus,
        summary: impl Into<String>,
        result: Option<String>,
        total_ms: Option<i64>,
    ) -> bool {
        let event = self.build_event(EventType::ProcessEnd, Some(step_sequence), None, status, summary, result, total_ms, None);
        self.logger.log(event).await
    }

    pub async fn error(
        &self,
        code: impl Into<String>,
        message: impl Into<String>,
        summary: Option<String>,
        result: Option<String>,
    ) -> bool {
        let summary = summary.unwrap_or_else(|| "error".to_string());
        let event = self.build_event(
            EventType::Error,
            None,
            None,
            EventStatus::Failure,
            summary,
            result,
            None,
            Some((code.into(), message.into())),
        );
        self.logger.log(event).await
    }

    #[allow(clippy::too_many_arguments)]
    fn build_event(
        &self,
        event_type: EventType,
        step_sequence: Option<i32>,
        step_name: Option<String>,
        status: EventStatus,
        summary: impl Into<String>,
        result: Option<String>,
        execution_time_override: Option<i64>,
        error: Option<(String, String)>,
    ) -> Event {
        let mut guard = self.state.lock().unwrap();

        let span_id = new_span_id();
        // Terminal events parent onto the root process-start's span rather
        // than the immediately preceding step, so PROCESS_END/ERROR always
        // close out the top-level span regardless of how many steps ran.
        let is_terminal = matches!(event_type, EventType::ProcessEnd | EventType::Error);
        let parent_span_id = if is_terminal {
            guard.root_span_id.clone().or_else(|| guard.last_span_id.clone())
        } else {
            guard.last_span_id.clone()
        };
        guard.last_span_id = Some(span_id.clone());

        // Correlation/trace resolution priority: (1) explicit value set via
        // `set_correlation_id`/`set_trace_id`; (2) an ambient context
        // collaborator, which this crate treats as an external,
        // unimplemented concern; (3) auto-generated here. A generated id is
        // written back into persistent state so it is a one-time mint, not
        // a fresh id on every emit — it must stay stable across the whole
        // process instance.
        let correlation_id = guard
            .persistent
            .correlation_id
            .get_or_insert_with(|| uuid::Uuid::new_v4().to_string())
            .clone();
        let trace_id = guard
            .persistent
            .trace_id
            .get_or_insert_with(|| uuid::Uuid::new_v4().to_string())
            .clone();

        let one_shot = std::mem::take(&mut guard.one_shot);
        let persistent = guard.persistent.clone();
        drop(guard);

        let (error_code, error_message) = match error {
            Some((code, message)) => (Some(code), Some(message)),
            None => (one_shot.error_code, one_shot.error_message),
        };

        Event {
            execution_id: None,
            correlation_id,
            trace_id,
            span_id: Some(span_id),
            parent_span_id,
            span_links: one_shot.span_links,
            account_id: persistent.account_id,
            batch_id: persistent.batch_id,
            application_id: persistent.application_id,
            originating_system: persistent.originating_system,
            target_system: one_shot.target_system.unwrap_or(persistent.target_system),
            process_name: self.process_name.clone(),
            step_sequence,
            step_name,
            event_type,
            event_status: status,
            identifiers: persistent.identifiers,
            metadata: persistent.metadata,
            summary: summary.into(),
            result,
            event_timestamp: Utc::now(),
            endpoint: one_shot.endpoint,
            http_method: one_shot.http_method,
            http_status_code: one_shot.http_status_code,
            request_payload: one_shot.request_payload,
            response_payload: one_shot.response_payload,
            error_code,
            error_message,
            execution_time_ms: execution_time_override.or(one_shot.execution_time_ms),
            idempotency_key: one_shot.idempotency_key,
            is_deleted: false,
        }
    }
}
