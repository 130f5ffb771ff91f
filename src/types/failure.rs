//! Scoring failures reported back to requesters

use crate::error::ScoringError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a transaction produced no verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Payload was not a transaction
    InvalidPayload,
    Schema,
    /// Required fields empty or out of range
    Validation,
    ModelInvocation,
    Internal,
}

/// Published to the request inbox in place of a verdict
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringFailure {
    pub failure_id: String,

    /// Correlation id from the incoming transaction, if one could be read
    pub transaction_id: Option<String>,

    pub kind: FailureKind,

    /// Human-readable reason, e.g. "required fields missing: merchant"
    pub error: String,

    pub timestamp: DateTime<Utc>,
}

impl ScoringFailure {
    pub fn new(transaction_id: Option<String>, kind: FailureKind, error: impl Into<String>) -> Self {
        Self {
            failure_id: uuid::Uuid::new_v4().to_string(),
            transaction_id,
            kind,
            error: error.into(),
            timestamp: Utc::now(),
        }
    }

    /// Failure for a transaction the core rejected
    pub fn from_error(transaction_id: Option<String>, error: &ScoringError) -> Self {
        let (kind, reason) = match error {
            ScoringError::Schema { .. } => (FailureKind::Schema, error.to_string()),
            ScoringError::Validation(msg) => (FailureKind::Validation, msg.clone()),
            ScoringError::ModelInvocation(msg) => (FailureKind::ModelInvocation, msg.clone()),
            other => (FailureKind::Internal, other.to_string()),
        };
        Self::new(transaction_id, kind, reason)
    }

    /// Failure for a payload that did not deserialize. The transaction id is
    /// recovered when the payload is at least a JSON object carrying one.
    pub fn invalid_payload(payload: &[u8], error: &serde_json::Error) -> Self {
        let transaction_id = serde_json::from_slice::<serde_json::Value>(payload)
            .ok()
            .and_then(|value| {
                value
                    .get("transaction_id")
                    .and_then(|id| id.as_str())
                    .map(String::from)
            });

        Self::new(
            transaction_id,
            FailureKind::InvalidPayload,
            format!("invalid transaction payload: {}", error),
        )
    }
}
