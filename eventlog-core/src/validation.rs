//! Shape validation for an [`Event`] before it is accepted by the client or
//! the store. Pure, synchronous, and independent of transport — both
//! `eventlog-sink` (to fail fast before queuing) and `eventlog-http` (to
//! build the 400 response body) call the same function.

use crate::event::{Event, EventStatus, EventType};

const MAX_ID_LEN: usize = 200;
const MAX_SPAN_LEN: usize = 64;
const MAX_SHORT_FIELD_LEN: usize = 200;
const MAX_TEXT_LEN: usize = 2048;

/// One field-level validation failure, suitable for rendering straight into
/// an HTTP 400 body as a list of field errors.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validates a single event's shape: status/type coupling, field length
/// limits, and required fields.
///
/// Returns every violation found rather than failing on the first one, so a
/// caller can report the complete set of problems in one response.
pub fn validate_event(event: &Event) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    check_len(
        "correlation_id",
        &event.correlation_id,
        1,
        MAX_ID_LEN,
        &mut errors,
    );
    check_len("trace_id", &event.trace_id, 1, MAX_ID_LEN, &mut errors);

    if let Some(span_id) = &event.span_id {
        check_len("span_id", span_id, 1, MAX_SPAN_LEN, &mut errors);
    }
    if let Some(parent) = &event.parent_span_id {
        check_len("parent_span_id", parent, 1, MAX_SPAN_LEN, &mut errors);
    }
    if let Some(account_id) = &event.account_id {
        check_len("account_id", account_id, 1, MAX_SPAN_LEN, &mut errors);
    }

    check_len(
        "application_id",
        &event.application_id,
        1,
        MAX_SHORT_FIELD_LEN,
        &mut errors,
    );
    check_len(
        "originating_system",
        &event.originating_system,
        1,
        MAX_SHORT_FIELD_LEN,
        &mut errors,
    );
    check_len(
        "target_system",
        &event.target_system,
        1,
        MAX_SHORT_FIELD_LEN,
        &mut errors,
    );

    if event.process_name.trim().is_empty() {
        errors.push(FieldError::new("process_name", "must not be empty"));
    }

    if event.summary.trim().is_empty() {
        errors.push(FieldError::new("summary", "must not be empty"));
    }
    if let Some(result) = &event.result {
        check_max_bytes("result", result, MAX_TEXT_LEN, &mut errors);
    }
    if let Some(message) = &event.error_message {
        check_max_bytes("error_message", message, MAX_TEXT_LEN, &mut errors);
    }

    if event.execution_time_ms.is_some_and(|ms| ms < 0) {
        errors.push(FieldError::new(
            "execution_time_ms",
            "must not be negative",
        ));
    }

    // Invariant (i): PROCESS_START implies step_sequence = 0 and status in
    // {SUCCESS, IN_PROGRESS}.
    if event.event_type == EventType::ProcessStart {
        if event.step_sequence.is_some() && event.step_sequence != Some(0) {
            errors.push(FieldError::new(
                "step_sequence",
                "PROCESS_START events must have step_sequence = 0",
            ));
        }
        if !matches!(
            event.event_status,
            EventStatus::Success | EventStatus::InProgress
        ) {
            errors.push(FieldError::new(
                "event_status",
                "PROCESS_START events must be SUCCESS or IN_PROGRESS",
            ));
        }
    }

    // Invariant (ii): PROCESS_END implies status in {SUCCESS, FAILURE}.
    if event.event_type == EventType::ProcessEnd
        && !matches!(event.event_status, EventStatus::Success | EventStatus::Failure)
    {
        errors.push(FieldError::new(
            "event_status",
            "PROCESS_END events must be SUCCESS or FAILURE",
        ));
    }

    // ERROR events with FAILURE status should carry error_code and
    // error_message, but it is advisory rather than rejected here.

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_len(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
    errors: &mut Vec<FieldError>,
) {
    let len = value.chars().count();
    if len < min {
        errors.push(FieldError::new(
            field,
            format!("must be at least {min} characters"),
        ));
    } else if len > max {
        errors.push(FieldError::new(
            field,
            format!("must be at most {max} characters"),
        ));
    }
}

fn check_max_bytes(field: &'static str, value: &str, max: usize, errors: &mut Vec<FieldError>) {
    if value.len() > max {
        errors.push(FieldError::new(
            field,
            format!("must be at most {max} bytes"),
        ));
    }
}
