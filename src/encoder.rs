//! Categorical label encoding for merchant, category and gender.
//!
//! The encoder vocabularies are fitted during training and shipped as a JSON
//! artifact. Each field's list is the fitted class list: the label at index
//! `i` encodes to `i`. Labels never seen in training fall back to
//! [`SENTINEL_CODE`] per value, so a novel merchant never blocks scoring.

use crate::error::{Result, ScoringError};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Code assigned to any label absent from its field's vocabulary.
pub const SENTINEL_CODE: i64 = -1;

/// The categorical columns the model was trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoricalField {
    Merchant,
    Category,
    Gender,
}

impl CategoricalField {
    pub const ALL: [CategoricalField; 3] = [
        CategoricalField::Merchant,
        CategoricalField::Category,
        CategoricalField::Gender,
    ];

    /// Column name as used in tables and the encoder artifact
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoricalField::Merchant => "merchant",
            CategoricalField::Category => "category",
            CategoricalField::Gender => "gender",
        }
    }
}

impl fmt::Display for CategoricalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoricalField {
    type Err = ScoringError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "merchant" => Ok(CategoricalField::Merchant),
            "category" => Ok(CategoricalField::Category),
            "gender" => Ok(CategoricalField::Gender),
            other => Err(ScoringError::UnknownField(other.to_string())),
        }
    }
}

/// Outcome of encoding one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Label was in the training vocabulary
    Known(i64),
    /// Label was never seen in training
    Unseen,
}

impl Encoding {
    /// Numeric code fed to the model
    pub fn code(&self) -> i64 {
        match self {
            Encoding::Known(code) => *code,
            Encoding::Unseen => SENTINEL_CODE,
        }
    }

    pub fn is_unseen(&self) -> bool {
        matches!(self, Encoding::Unseen)
    }
}

/// Fitted bijection between labels and codes for one field.
#[derive(Debug, Clone, Default)]
pub struct LabelEncoder {
    classes: Vec<String>,
    index: HashMap<String, i64>,
}

impl LabelEncoder {
    /// Build from a fitted class list. Duplicate labels are rejected since
    /// they would break the bijection.
    pub fn from_classes(classes: Vec<String>) -> Result<Self> {
        let mut index = HashMap::with_capacity(classes.len());
        for (code, label) in classes.iter().enumerate() {
            if index.insert(label.clone(), code as i64).is_some() {
                return Err(ScoringError::Encoder(format!("duplicate label '{}'", label)));
            }
        }
        Ok(Self { classes, index })
    }

    pub fn transform(&self, label: &str) -> Encoding {
        match self.index.get(label) {
            Some(&code) => Encoding::Known(code),
            None => Encoding::Unseen,
        }
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[derive(Deserialize)]
struct EncoderArtifact {
    merchant: Vec<String>,
    category: Vec<String>,
    gender: Vec<String>,
}

/// Read-only encoders for every categorical field.
#[derive(Debug, Clone)]
pub struct EncoderTable {
    merchant: LabelEncoder,
    category: LabelEncoder,
    gender: LabelEncoder,
}

impl EncoderTable {
    pub fn new(merchant: LabelEncoder, category: LabelEncoder, gender: LabelEncoder) -> Self {
        Self {
            merchant,
            category,
            gender,
        }
    }

    /// Parse the encoder artifact from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let artifact: EncoderArtifact = serde_json::from_str(json)
            .map_err(|e| ScoringError::Encoder(format!("invalid encoder artifact: {}", e)))?;

        Ok(Self::new(
            LabelEncoder::from_classes(artifact.merchant)?,
            LabelEncoder::from_classes(artifact.category)?,
            LabelEncoder::from_classes(artifact.gender)?,
        ))
    }

    /// Load the encoder artifact from disk
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let table = Self::from_json_str(&json)?;

        info!(
            path = %path.display(),
            merchants = table.merchant.len(),
            categories = table.category.len(),
            genders = table.gender.len(),
            "Encoder table loaded"
        );

        Ok(table)
    }

    pub fn encoder(&self, field: CategoricalField) -> &LabelEncoder {
        match field {
            CategoricalField::Merchant => &self.merchant,
            CategoricalField::Category => &self.category,
            CategoricalField::Gender => &self.gender,
        }
    }

    /// Typed encoding; cannot fail
    pub fn encode_field(&self, field: CategoricalField, value: &str) -> Encoding {
        self.encoder(field).transform(value)
    }

    /// Encode by field name. Unseen labels give -1; an unrecognized field
    /// name is an error.
    pub fn encode(&self, field: &str, value: &str) -> Result<i64> {
        let field: CategoricalField = field.parse()?;
        Ok(self.encode_field(field, value).code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> EncoderTable {
        EncoderTable::from_json_str(
            r#"{
                "merchant": ["BigBox", "QuickMart", "fraud_Kirlin and Sons"],
                "category": ["gas_transport", "grocery", "shopping_net"],
                "gender": ["F", "Female", "M", "Male"]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_known_labels_use_fitted_codes() {
        let table = table();
        assert_eq!(table.encode("merchant", "BigBox").unwrap(), 0);
        assert_eq!(table.encode("merchant", "QuickMart").unwrap(), 1);
        assert_eq!(table.encode("category", "shopping_net").unwrap(), 2);
        assert_eq!(table.encode("gender", "Male").unwrap(), 3);
    }

    #[test]
    fn test_unseen_label_is_sentinel() {
        let table = table();
        assert_eq!(table.encode("merchant", "Corner Deli").unwrap(), SENTINEL_CODE);
        assert_eq!(table.encode("category", "").unwrap(), -1);
        assert_eq!(
            table.encode_field(CategoricalField::Gender, "X"),
            Encoding::Unseen
        );
    }

    #[test]
    fn test_labels_are_case_sensitive() {
        assert_eq!(table().encode("merchant", "quickmart").unwrap(), -1);
    }

    #[test]
    fn test_unknown_field_fails() {
        let err = table().encode("amt", "45.20").unwrap_err();
        assert!(matches!(err, ScoringError::UnknownField(ref f) if f == "amt"));
    }

    #[test]
    fn test_duplicate_label_rejected() {
        let result = LabelEncoder::from_classes(vec!["a".to_string(), "a".to_string()]);
        assert!(matches!(result, Err(ScoringError::Encoder(_))));
    }

    #[test]
    fn test_missing_field_in_artifact_rejected() {
        let result = EncoderTable::from_json_str(r#"{"merchant": [], "category": []}"#);
        assert!(matches!(result, Err(ScoringError::Encoder(_))));
    }

    #[test]
    fn test_field_names_round_trip() {
        for field in CategoricalField::ALL {
            assert_eq!(field.as_str().parse::<CategoricalField>().unwrap(), field);
        }
    }
}
