//! Classifier boundary

use crate::feature_assembler::FeatureVector;
use anyhow::Result;

/// A pre-trained binary classifier over assembled feature rows.
///
/// Implementations return one label per input row, in input order, where
/// `1` means fraud.
pub trait Classifier: Send + Sync {
    /// Model name for logs
    fn name(&self) -> &str;

    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<i64>>;
}
