//! Fraud Scoring Pipeline Library
//!
//! Prepares card transactions for a pre-trained fraud classifier and maps its
//! output to verdicts, for single transactions and for batch tables.

pub mod batch;
pub mod config;
pub mod consumer;
pub mod encoder;
pub mod error;
pub mod feature_assembler;
pub mod geo;
pub mod metrics;
pub mod models;
pub mod obfuscator;
pub mod pipeline;
pub mod producer;
pub mod scorer;
pub mod types;

pub use batch::{ScoredTable, TransactionTable};
pub use config::AppConfig;
pub use encoder::{CategoricalField, EncoderTable, Encoding};
pub use error::{Result, ScoringError};
pub use feature_assembler::{FeatureAssembler, FeatureVector};
pub use models::Classifier;
pub use pipeline::{FraudPipeline, ScoringContext};
pub use scorer::FraudScorer;
pub use types::{FailureKind, ScoringFailure, Transaction, Verdict, VerdictMessage};
