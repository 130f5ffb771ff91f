//! ONNX Runtime classifier

use crate::feature_assembler::{FeatureVector, FEATURE_COUNT};
use crate::models::classifier::Classifier;
use anyhow::{Context, Result};
use ort::memory::Allocator;
use ort::session::Session;
use ort::value::{DynMapValueType, DynSequenceValueType, DowncastableTarget, Tensor};
use std::sync::Mutex;
use tracing::debug;

/// Fraud classifier backed by an ONNX Runtime session
pub struct OnnxClassifier {
    name: String,
    /// `Session::run` needs exclusive access
    session: Mutex<Session>,
    input_name: String,
    label_output: Option<String>,
    probability_output: Option<String>,
    probability_threshold: f32,
}

impl OnnxClassifier {
    pub fn new(
        name: String,
        session: Session,
        input_name: String,
        label_output: Option<String>,
        probability_output: Option<String>,
        probability_threshold: f32,
    ) -> Self {
        Self {
            name,
            session: Mutex::new(session),
            input_name,
            label_output,
            probability_output,
            probability_threshold,
        }
    }

    /// Labels from class-1 probabilities in either tensor `[N, 2]` form or
    /// the `seq(map(int64, float))` form emitted by LightGBM/CatBoost exports.
    fn labels_from_probabilities(&self, output: &ort::value::DynValue, rows: usize) -> Result<Vec<i64>> {
        let probs = if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
            let dims: Vec<i64> = shape.iter().copied().collect();
            fraud_probabilities(&dims, data, rows)?
        } else if DynSequenceValueType::can_downcast(&output.dtype()) {
            self.fraud_probs_from_sequence_map(output)?
        } else {
            anyhow::bail!("Unsupported probability output type");
        };

        Ok(labels_at_threshold(&probs, self.probability_threshold))
    }

    fn fraud_probs_from_sequence_map(&self, output: &ort::value::DynValue) -> Result<Vec<f32>> {
        let allocator = Allocator::default();

        let sequence = output
            .downcast_ref::<DynSequenceValueType>()
            .map_err(|e| anyhow::anyhow!("Failed to downcast to sequence: {}", e))?;

        // One map per row
        let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;

        maps.iter()
            .map(|map_value| {
                let kv_pairs = map_value.try_extract_key_values::<i64, f32>()?;
                fraud_probability_from_map(&kv_pairs)
            })
            .collect()
    }
}

/// Class-1 probability per row from a flat probability tensor.
///
/// `[N, C]` with `C >= 2` reads column 1 of each row; `[N, 1]` and `[N]`
/// hold the class-1 probability directly.
fn fraud_probabilities(shape: &[i64], data: &[f32], rows: usize) -> Result<Vec<f32>> {
    let classes = match shape {
        [_, c] => usize::try_from(*c).unwrap_or(1),
        _ => 1,
    };

    (0..rows)
        .map(|i| {
            let idx = if classes >= 2 { i * classes + 1 } else { i };
            data.get(idx).copied().context("Probability tensor too short")
        })
        .collect()
}

/// Class-1 probability from one `{class: probability}` map, falling back to
/// `1 - p(class 0)` when class 1 is absent.
fn fraud_probability_from_map(pairs: &[(i64, f32)]) -> Result<f32> {
    if let Some((_, prob)) = pairs.iter().find(|(class_id, _)| *class_id == 1) {
        return Ok(*prob);
    }
    pairs
        .iter()
        .find(|(class_id, _)| *class_id == 0)
        .map(|(_, prob)| 1.0 - *prob)
        .ok_or_else(|| anyhow::anyhow!("No probability found in map"))
}

/// Probability at or above the threshold is fraud (1).
fn labels_at_threshold(probs: &[f32], threshold: f32) -> Vec<i64> {
    probs.iter().map(|&p| i64::from(p >= threshold)).collect()
}

impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<i64>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let data: Vec<f32> = rows.iter().flat_map(|r| r.to_array()).collect();
        let shape = vec![rows.len() as i64, FEATURE_COUNT as i64];
        let input_tensor =
            Tensor::from_array((shape, data)).context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        let outputs = session.run(ort::inputs![&self.input_name => input_tensor])?;

        let labels = if let Some(output) = self
            .label_output
            .as_deref()
            .and_then(|name| outputs.get(name))
        {
            let (_, data) = output
                .try_extract_tensor::<i64>()
                .context("Label output is not an int64 tensor")?;
            data.to_vec()
        } else if let Some(output) = self
            .probability_output
            .as_deref()
            .and_then(|name| outputs.get(name))
        {
            self.labels_from_probabilities(output, rows.len())?
        } else {
            anyhow::bail!("Model {} produced no usable output", self.name);
        };

        debug!(model = %self.name, rows = rows.len(), "Inference complete");

        Ok(labels)
    }
}
