use serde::{Deserialize, Serialize};

/// Static catalog entry describing a known `process_name`: who owns it, how
/// many steps it is expected to take, and its SLA. Read on description/SLA
/// paths only — never consulted on the event insert hot path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessDefinition {
    pub process_name: String,
    pub owning_team: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_step_count: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sla_ms: Option<i64>,
}
