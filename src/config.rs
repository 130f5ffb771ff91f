//! Configuration management for the scoring pipeline

use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    pub models: ModelsConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject for incoming transactions
    pub transaction_subject: String,
    /// Subject for outgoing verdicts
    pub verdict_subject: String,
    /// Queue group shared by scaled-out instances; plain subscription if unset
    #[serde(default)]
    pub queue_group: Option<String>,
}

/// Model and encoder artifacts
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    /// ONNX export of the trained classifier
    pub model_path: String,
    /// JSON export of the fitted label encoders
    pub encoders_path: String,
    /// Number of threads for ONNX inference (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
    /// Class-1 probability cutoff, used only for models without a label output
    #[serde(default = "default_probability_threshold")]
    pub probability_threshold: f32,
}

fn default_onnx_threads() -> usize {
    1
}

fn default_probability_threshold() -> f32 {
    0.5
}

/// Service pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Maximum transactions scored concurrently
    pub workers: usize,
    /// Seconds between metrics summaries
    pub metrics_interval_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            metrics_interval_secs: 30,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                transaction_subject: "transactions".to_string(),
                verdict_subject: "fraud.verdicts".to_string(),
                queue_group: None,
            },
            models: ModelsConfig {
                model_path: "models/fraud_detection_model.onnx".to_string(),
                encoders_path: "models/label_encoders.json".to_string(),
                onnx_threads: 1,
                probability_threshold: 0.5,
            },
            pipeline: PipelineConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
