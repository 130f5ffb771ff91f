//! ONNX model loader

use crate::models::inference::OnnxClassifier;
use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;
use tracing::info;

/// Loader for the exported fraud classifier
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a new model loader with specified number of threads
    pub fn with_threads(onnx_threads: usize) -> Result<Self> {
        ort::init().commit()?;
        info!(onnx_threads = onnx_threads, "ONNX Runtime initialized");
        Ok(Self { onnx_threads })
    }

    /// Load the classifier from an ONNX file.
    ///
    /// `probability_threshold` is only used when the graph exposes class
    /// probabilities but no label output.
    pub fn load_classifier<P: AsRef<Path>>(
        &self,
        path: P,
        probability_threshold: f32,
    ) -> Result<OnnxClassifier> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "classifier".to_string());

        info!(model = %name, path = %path.display(), threads = self.onnx_threads, "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.onnx_threads)?
            .commit_from_file(path)
            .context(format!("Failed to load model from {:?}", path))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        // skl2onnx / onnxmltools exports name these "label" and "probabilities"
        let label_output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("label"))
            .map(|o| o.name.clone());

        let probability_output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .map(|o| o.name.clone());

        if label_output.is_none() && probability_output.is_none() {
            anyhow::bail!(
                "Model {} exposes neither a label nor a probability output",
                path.display()
            );
        }

        info!(
            model = %name,
            input = %input_name,
            label_output = ?label_output,
            probability_output = ?probability_output,
            "Model loaded successfully"
        );

        Ok(OnnxClassifier::new(
            name,
            session,
            input_name,
            label_output,
            probability_output,
            probability_threshold,
        ))
    }
}
