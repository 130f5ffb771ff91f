//! Raw card transaction as supplied by the caller

use crate::error::{Result, ScoringError};
use serde::{Deserialize, Deserializer, Serialize};

/// A card transaction to be scored.
///
/// Field names follow the training dataset columns so the same struct reads
/// service JSON and batch table rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Caller-side correlation id, never used as a feature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,

    /// Merchant name
    pub merchant: String,

    /// Merchant category (e.g. "grocery_pos")
    pub category: String,

    /// Transaction amount
    pub amt: f64,

    /// Cardholder latitude at transaction time
    pub lat: f64,

    /// Cardholder longitude at transaction time
    pub long: f64,

    /// Merchant latitude
    pub merch_lat: f64,

    /// Merchant longitude
    pub merch_long: f64,

    /// Hour of day (0-23)
    pub hour: u32,

    /// Day of month (1-31)
    pub day: u32,

    /// Month (1-12)
    pub month: u32,

    /// Gender label as spelled in the training vocabulary
    pub gender: String,

    /// Card number. Sensitive: only its obfuscated bucket is a feature.
    #[serde(deserialize_with = "string_or_number")]
    pub cc_num: String,
}

impl Transaction {
    /// Check the fields a single scoring request must carry.
    ///
    /// Empty text fields are reported together, then numeric ranges.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.merchant.trim().is_empty() {
            missing.push("merchant");
        }
        if self.category.trim().is_empty() {
            missing.push("category");
        }
        if self.gender.trim().is_empty() {
            missing.push("gender");
        }
        if self.cc_num.trim().is_empty() {
            missing.push("cc_num");
        }
        if !missing.is_empty() {
            return Err(ScoringError::missing_fields(&missing));
        }

        self.validate_ranges()
    }

    /// Numeric range checks shared by single and batch inputs.
    pub fn validate_ranges(&self) -> Result<()> {
        if !self.amt.is_finite() || self.amt < 0.0 {
            return Err(ScoringError::Validation(format!(
                "amt must be a non-negative number, got {}",
                self.amt
            )));
        }
        if self.hour > 23 {
            return Err(ScoringError::Validation(format!(
                "hour must be in 0..=23, got {}",
                self.hour
            )));
        }
        if !(1..=31).contains(&self.day) {
            return Err(ScoringError::Validation(format!(
                "day must be in 1..=31, got {}",
                self.day
            )));
        }
        if !(1..=12).contains(&self.month) {
            return Err(ScoringError::Validation(format!(
                "month must be in 1..=12, got {}",
                self.month
            )));
        }
        Ok(())
    }
}

/// Card numbers arrive as JSON strings or as bare integers.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(u64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
    })
}

#[cfg(test)]
pub(crate) fn sample() -> Transaction {
    Transaction {
        transaction_id: Some("tx_001".to_string()),
        merchant: "QuickMart".to_string(),
        category: "grocery".to_string(),
        amt: 45.20,
        lat: 40.7128,
        long: -74.0060,
        merch_lat: 40.7300,
        merch_long: -73.9950,
        hour: 14,
        day: 10,
        month: 3,
        gender: "Female".to_string(),
        cc_num: "4111111111111111".to_string(),
    }
}
