//! Shared fixtures for integration tests

#![allow(dead_code)]

use fraud_scoring_pipeline::metrics::PipelineMetrics;
use fraud_scoring_pipeline::{
    Classifier, EncoderTable, FeatureVector, FraudPipeline, ScoringContext, Transaction,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const ENCODERS_JSON: &str = r#"{
    "merchant": ["BigBox", "QuickMart", "fraud_Kirlin and Sons"],
    "category": ["gas_transport", "grocery", "shopping_net"],
    "gender": ["F", "Female", "M", "Male"]
}"#;

pub const BATCH_HEADER: &str =
    "merchant,category,amt,lat,long,merch_lat,merch_long,hour,day,month,gender,cc_num";

pub fn encoders() -> EncoderTable {
    EncoderTable::from_json_str(ENCODERS_JSON).expect("fixture encoders")
}

/// Flags large night-time purchases; records every batch it sees.
#[derive(Default)]
pub struct RuleClassifier {
    pub calls: AtomicUsize,
    pub seen: Mutex<Vec<Vec<FeatureVector>>>,
}

impl Classifier for RuleClassifier {
    fn name(&self) -> &str {
        "rule"
    }

    fn predict(&self, rows: &[FeatureVector]) -> anyhow::Result<Vec<i64>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(rows.to_vec());
        }
        Ok(rows
            .iter()
            .map(|r| i64::from(r.amt > 500.0 && r.hour < 5))
            .collect())
    }
}

/// Always errors, like a model fed the wrong input shape
pub struct FailingClassifier;

impl Classifier for FailingClassifier {
    fn name(&self) -> &str {
        "failing"
    }

    fn predict(&self, _rows: &[FeatureVector]) -> anyhow::Result<Vec<i64>> {
        anyhow::bail!("input shape mismatch: expected [N, 9]")
    }
}

pub fn pipeline_with(classifier: Arc<dyn Classifier>) -> (FraudPipeline, Arc<PipelineMetrics>) {
    let metrics = Arc::new(PipelineMetrics::new());
    let context = ScoringContext::new(encoders(), classifier);
    (FraudPipeline::new(&context, metrics.clone()), metrics)
}

pub fn quickmart() -> Transaction {
    Transaction {
        transaction_id: Some("tx_quickmart".to_string()),
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

/// The same transaction as a batch CSV row
pub const QUICKMART_ROW: &str =
    "QuickMart,grocery,45.20,40.7128,-74.0060,40.7300,-73.9950,14,10,3,Female,4111111111111111";
