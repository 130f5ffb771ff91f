//! Scoring outcomes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary classification outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    Legitimate,
    Fraudulent,
}

impl Verdict {
    /// Map a raw model label: `1` is fraud, anything else is legitimate.
    pub fn from_prediction(label: i64) -> Self {
        if label == 1 {
            Verdict::Fraudulent
        } else {
            Verdict::Legitimate
        }
    }

    /// Literal written to the `Prediction` column
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Legitimate => "Legitimate",
            Verdict::Fraudulent => "Fraudulent",
        }
    }

    pub fn is_fraudulent(&self) -> bool {
        matches!(self, Verdict::Fraudulent)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict published back to the requester
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerdictMessage {
    /// Unique verdict identifier
    pub verdict_id: String,

    /// Correlation id from the incoming transaction, if any
    pub transaction_id: Option<String>,

    pub verdict: Verdict,

    /// Categorical fields that were scored with the unseen-label code
    pub unseen_fields: Vec<String>,

    /// Scoring timestamp
    pub timestamp: DateTime<Utc>,
}

impl VerdictMessage {
    pub fn new(transaction_id: Option<String>, verdict: Verdict) -> Self {
        Self {
            verdict_id: uuid::Uuid::new_v4().to_string(),
            transaction_id,
            verdict,
            unseen_fields: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_unseen_fields(mut self, fields: Vec<String>) -> Self {
        self.unseen_fields = fields;
        self
    }
}
