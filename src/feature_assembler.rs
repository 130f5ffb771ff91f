//! Feature assembly for fraud model inference.
//!
//! Turns raw transactions into the fixed-order numeric vector the classifier
//! was trained on. Single transactions and batch tables go through the same
//! row transform, so both paths yield identical columns in identical order.

use crate::batch::TransactionTable;
use crate::encoder::{CategoricalField, EncoderTable};
use crate::error::Result;
use crate::geo;
use crate::obfuscator;
use crate::types::transaction::Transaction;
use std::sync::Arc;
use tracing::debug;

/// Number of model input columns
pub const FEATURE_COUNT: usize = 9;

/// Model input columns in training order. Changing this requires retraining.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "merchant", "category", "amt", "distance", "hour", "day", "month", "gender", "cc_num",
];

/// One row of model input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    pub merchant: i64,
    pub category: i64,
    pub amt: f64,
    /// Kilometers between cardholder and merchant
    pub distance: f64,
    pub hour: u32,
    pub day: u32,
    pub month: u32,
    pub gender: i64,
    /// Obfuscated card number bucket
    pub cc_num: u32,
}

impl FeatureVector {
    /// Values in `FEATURE_NAMES` order, as the model consumes them
    pub fn to_array(&self) -> [f32; FEATURE_COUNT] {
        [
            self.merchant as f32,
            self.category as f32,
            self.amt as f32,
            self.distance as f32,
            self.hour as f32,
            self.day as f32,
            self.month as f32,
            self.gender as f32,
            self.cc_num as f32,
        ]
    }

    /// Values formatted for a delimited table, in `FEATURE_NAMES` order
    pub fn to_record(&self) -> [String; FEATURE_COUNT] {
        [
            self.merchant.to_string(),
            self.category.to_string(),
            self.amt.to_string(),
            self.distance.to_string(),
            self.hour.to_string(),
            self.day.to_string(),
            self.month.to_string(),
            self.gender.to_string(),
            self.cc_num.to_string(),
        ]
    }

    /// Columns holding NaN or infinity
    pub fn non_finite_columns(&self) -> Vec<&'static str> {
        let mut columns = Vec::new();
        if !self.amt.is_finite() {
            columns.push("amt");
        }
        if !self.distance.is_finite() {
            columns.push("distance");
        }
        columns
    }
}

/// An assembled row together with the fields that fell back to the
/// unseen-label code.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledRow {
    pub features: FeatureVector,
    pub unseen: Vec<CategoricalField>,
}

/// Assembled rows in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    rows: Vec<AssembledRow>,
}

impl FeatureTable {
    pub fn new(rows: Vec<AssembledRow>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[AssembledRow] {
        &self.rows
    }

    pub fn features(&self) -> Vec<FeatureVector> {
        self.rows.iter().map(|r| r.features).collect()
    }

    /// How many rows used the unseen-label code for `field`
    pub fn unseen_count(&self, field: CategoricalField) -> usize {
        self.rows.iter().filter(|r| r.unseen.contains(&field)).count()
    }
}

/// Builds model input from raw transactions using the fitted encoders.
#[derive(Clone)]
pub struct FeatureAssembler {
    encoders: Arc<EncoderTable>,
}

impl FeatureAssembler {
    pub fn new(encoders: Arc<EncoderTable>) -> Self {
        Self { encoders }
    }

    /// Assemble a single transaction after checking its required fields.
    pub fn assemble(&self, tx: &Transaction) -> Result<AssembledRow> {
        tx.validate()?;
        Ok(self.assemble_row(tx))
    }

    /// Assemble every row of a batch table.
    ///
    /// The whole table is rejected if a required column is missing or any
    /// row fails to parse; nothing is assembled in that case.
    pub fn assemble_batch(&self, table: &TransactionTable) -> Result<FeatureTable> {
        let transactions = table.transactions()?;
        Ok(self.assemble_all(&transactions))
    }

    /// Assemble already-parsed transactions without field validation.
    pub fn assemble_all(&self, transactions: &[Transaction]) -> FeatureTable {
        FeatureTable::new(transactions.iter().map(|tx| self.assemble_row(tx)).collect())
    }

    /// The row transform shared by the single and batch paths.
    ///
    /// Coordinates are consumed by the distance computation and do not
    /// appear in the output.
    pub fn assemble_row(&self, tx: &Transaction) -> AssembledRow {
        let mut unseen = Vec::new();
        let mut encode = |field: CategoricalField, value: &str| {
            let encoding = self.encoders.encode_field(field, value);
            if encoding.is_unseen() {
                debug!(field = %field, label = %value, "Unseen label, using sentinel code");
                unseen.push(field);
            }
            encoding.code()
        };

        let merchant = encode(CategoricalField::Merchant, &tx.merchant);
        let category = encode(CategoricalField::Category, &tx.category);
        let gender = encode(CategoricalField::Gender, &tx.gender);

        let features = FeatureVector {
            merchant,
            category,
            amt: tx.amt,
            distance: geo::distance(tx.lat, tx.long, tx.merch_lat, tx.merch_long),
            hour: tx.hour,
            day: tx.day,
            month: tx.month,
            gender,
            cc_num: obfuscator::obfuscate(&tx.cc_num),
        };

        AssembledRow { features, unseen }
    }

    pub fn feature_count(&self) -> usize {
        FEATURE_COUNT
    }

    pub fn feature_names(&self) -> &'static [&'static str] {
        &FEATURE_NAMES
    }
}
