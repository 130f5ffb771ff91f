//! Error types for the scoring core

use thiserror::Error;

/// Errors surfaced by feature assembly and scoring.
///
/// Every variant is recoverable at the request or batch boundary.
#[derive(Error, Debug)]
pub enum ScoringError {
    /// Batch input is missing one or more required columns
    #[error("Schema error: missing required columns: {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    /// Required fields are empty, unparsable, or non-numeric after assembly
    #[error("Validation error: {0}")]
    Validation(String),

    /// The classifier failed or returned malformed output
    #[error("Model invocation error: {0}")]
    ModelInvocation(String),

    /// A field name that is not one of the encoded categorical fields
    #[error("Unknown categorical field: {0}")]
    UnknownField(String),

    /// Malformed encoder artifact
    #[error("Encoder error: {0}")]
    Encoder(String),

    /// Delimited table could not be read or written
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScoringError {
    /// Build a validation error listing the fields that failed.
    pub fn missing_fields(fields: &[&str]) -> Self {
        ScoringError::Validation(format!("required fields missing: {}", fields.join(", ")))
    }
}

/// Result type for scoring operations
pub type Result<T> = std::result::Result<T, ScoringError>;
