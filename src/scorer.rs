//! Verdicts from assembled features

use crate::batch::{ScoredRow, ScoredTable};
use crate::error::{Result, ScoringError};
use crate::feature_assembler::{FeatureTable, FeatureVector};
use crate::models::classifier::Classifier;
use crate::types::verdict::Verdict;
use std::sync::Arc;
use tracing::{debug, error};

/// Runs the classifier and maps labels to verdicts.
#[derive(Clone)]
pub struct FraudScorer {
    classifier: Arc<dyn Classifier>,
}

impl FraudScorer {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self { classifier }
    }

    /// Score one feature vector.
    pub fn score(&self, features: &FeatureVector) -> Result<Verdict> {
        let non_finite = features.non_finite_columns();
        if !non_finite.is_empty() {
            return Err(ScoringError::Validation(format!(
                "non-numeric features: {}",
                non_finite.join(", ")
            )));
        }

        let verdicts = self.predict(std::slice::from_ref(features))?;
        verdicts
            .into_iter()
            .next()
            .ok_or_else(|| ScoringError::ModelInvocation("classifier returned no prediction".to_string()))
    }

    /// Score many feature vectors; verdicts come back in input order.
    ///
    /// Any non-numeric row rejects the whole batch before the model runs.
    pub fn score_batch(&self, rows: &[FeatureVector]) -> Result<Vec<Verdict>> {
        for (i, features) in rows.iter().enumerate() {
            let non_finite = features.non_finite_columns();
            if !non_finite.is_empty() {
                return Err(ScoringError::Validation(format!(
                    "row {}: non-numeric features: {}",
                    i + 1,
                    non_finite.join(", ")
                )));
            }
        }

        self.predict(rows)
    }

    /// Score a feature table into a new table with one verdict per row.
    pub fn annotate(&self, table: &FeatureTable) -> Result<ScoredTable> {
        let verdicts = self.score_batch(&table.features())?;

        Ok(ScoredTable::new(
            table
                .rows()
                .iter()
                .cloned()
                .zip(verdicts)
                .map(|(row, verdict)| ScoredRow { row, verdict })
                .collect(),
        ))
    }

    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<Verdict>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let labels = self.classifier.predict(rows).map_err(|e| {
            error!(model = %self.classifier.name(), error = %e, "Inference failed");
            ScoringError::ModelInvocation(format!("{:#}", e))
        })?;

        if labels.len() != rows.len() {
            return Err(ScoringError::ModelInvocation(format!(
                "classifier returned {} predictions for {} rows",
                labels.len(),
                rows.len()
            )));
        }

        debug!(model = %self.classifier.name(), rows = rows.len(), "Scored");

        Ok(labels.into_iter().map(Verdict::from_prediction).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AmountRule;

    impl Classifier for AmountRule {
        fn name(&self) -> &str {
            "amount_rule"
        }

        fn predict(&self, rows: &[FeatureVector]) -> anyhow::Result<Vec<i64>> {
            Ok(rows.iter().map(|r| i64::from(r.amt > 500.0)).collect())
        }
    }

    struct Broken;

    impl Classifier for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn predict(&self, _rows: &[FeatureVector]) -> anyhow::Result<Vec<i64>> {
            anyhow::bail!("feature count mismatch")
        }
    }

    struct ShortOutput;

    impl Classifier for ShortOutput {
        fn name(&self) -> &str {
            "short"
        }

        fn predict(&self, _rows: &[FeatureVector]) -> anyhow::Result<Vec<i64>> {
            Ok(vec![0])
        }
    }

    fn features(amt: f64) -> FeatureVector {
        FeatureVector {
            merchant: 1,
            category: 1,
            amt,
            distance: 2.1,
            hour: 14,
            day: 10,
            month: 3,
            gender: 0,
            cc_num: 80,
        }
    }

    #[test]
    fn test_single_verdict() {
        let scorer = FraudScorer::new(Arc::new(AmountRule));
        assert_eq!(scorer.score(&features(45.2)).unwrap(), Verdict::Legitimate);
        assert_eq!(scorer.score(&features(900.0)).unwrap(), Verdict::Fraudulent);
    }

    #[test]
    fn test_batch_preserves_order() {
        let scorer = FraudScorer::new(Arc::new(AmountRule));
        let verdicts = scorer
            .score_batch(&[features(10.0), features(1000.0), features(20.0)])
            .unwrap();
        assert_eq!(
            verdicts,
            vec![Verdict::Legitimate, Verdict::Fraudulent, Verdict::Legitimate]
        );
    }

    #[test]
    fn test_non_finite_features_rejected_before_model() {
        let scorer = FraudScorer::new(Arc::new(Broken));
        let mut bad = features(10.0);
        bad.distance = f64::NAN;

        let err = scorer.score(&bad).unwrap_err();
        assert!(matches!(err, ScoringError::Validation(_)));
        assert!(err.to_string().contains("distance"));

        let err = scorer.score_batch(&[features(1.0), bad]).unwrap_err();
        assert!(err.to_string().contains("row 2"));
    }

    #[test]
    fn test_model_failure_surfaces() {
        let scorer = FraudScorer::new(Arc::new(Broken));
        let err = scorer.score(&features(10.0)).unwrap_err();
        assert!(matches!(err, ScoringError::ModelInvocation(_)));
        assert!(err.to_string().contains("feature count mismatch"));
    }

    #[test]
    fn test_wrong_prediction_count() {
        let scorer = FraudScorer::new(Arc::new(ShortOutput));
        let err = scorer
            .score_batch(&[features(1.0), features(2.0)])
            .unwrap_err();
        assert!(matches!(err, ScoringError::ModelInvocation(_)));
    }

    #[test]
    fn test_empty_batch_skips_model() {
        let scorer = FraudScorer::new(Arc::new(Broken));
        assert!(scorer.score_batch(&[]).unwrap().is_empty());
    }
}
