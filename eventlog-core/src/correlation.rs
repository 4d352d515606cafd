use serde::{Deserialize, Serialize};

/// Late-binding relation from a `correlation_id` to an `account_id`.
///
/// One row per `correlation_id`; created once a downstream system has
/// assigned the account, well after the events it describes were stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationLink {
    pub correlation_id: String,
    pub account_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_last4: Option<String>,
}

/// Request body for `POST /v1/correlation-links`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCorrelationLinkRequest {
    pub correlation_id: String,
    pub account_id: String,
    #[serde(default)]
    pub application_id: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub card_last4: Option<String>,
}
