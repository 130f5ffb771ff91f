//! End-to-end scoring over an explicitly owned model context

use crate::batch::{ScoredTable, TransactionTable};
use crate::config::ModelsConfig;
use crate::encoder::{CategoricalField, EncoderTable};
use crate::error::{Result, ScoringError};
use crate::feature_assembler::{FeatureAssembler, FeatureVector};
use crate::metrics::PipelineMetrics;
use crate::models::classifier::Classifier;
use crate::models::loader::ModelLoader;
use crate::scorer::FraudScorer;
use crate::types::transaction::Transaction;
use crate::types::verdict::Verdict;
use anyhow::Context;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Read-only artifacts loaded once at start.
#[derive(Clone)]
pub struct ScoringContext {
    pub encoders: Arc<EncoderTable>,
    pub classifier: Arc<dyn Classifier>,
}

impl ScoringContext {
    pub fn new(encoders: EncoderTable, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            encoders: Arc::new(encoders),
            classifier,
        }
    }

    /// Load the encoder table and ONNX classifier named in the config.
    pub fn load(config: &ModelsConfig) -> anyhow::Result<Self> {
        let encoders = EncoderTable::from_json_file(&config.encoders_path)
            .with_context(|| format!("Failed to load encoders from {}", config.encoders_path))?;

        let loader = ModelLoader::with_threads(config.onnx_threads)?;
        let classifier = loader.load_classifier(&config.model_path, config.probability_threshold)?;

        Ok(Self::new(encoders, Arc::new(classifier)))
    }
}

/// Result of scoring one transaction
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredTransaction {
    pub verdict: Verdict,
    pub features: FeatureVector,
    pub unseen: Vec<CategoricalField>,
}

/// Assembler, scorer and metrics bound to one context.
pub struct FraudPipeline {
    assembler: FeatureAssembler,
    scorer: FraudScorer,
    metrics: Arc<PipelineMetrics>,
}

impl FraudPipeline {
    pub fn new(context: &ScoringContext, metrics: Arc<PipelineMetrics>) -> Self {
        Self {
            assembler: FeatureAssembler::new(context.encoders.clone()),
            scorer: FraudScorer::new(context.classifier.clone()),
            metrics,
        }
    }

    pub fn assembler(&self) -> &FeatureAssembler {
        &self.assembler
    }

    pub fn metrics(&self) -> &Arc<PipelineMetrics> {
        &self.metrics
    }

    /// Validate, assemble and score a single transaction.
    pub fn score_transaction(&self, tx: &Transaction) -> Result<ScoredTransaction> {
        let start = Instant::now();

        let row = self.assembler.assemble(tx).inspect_err(|e| self.record_error(e))?;
        let verdict = self
            .scorer
            .score(&row.features)
            .inspect_err(|e| self.record_error(e))?;

        self.metrics.record_unseen(&row.unseen);
        self.metrics.record_verdict(verdict);
        self.metrics.record_processing_time(start.elapsed());

        debug!(
            transaction_id = tx.transaction_id.as_deref().unwrap_or("-"),
            verdict = %verdict,
            unseen = row.unseen.len(),
            "Transaction scored"
        );

        Ok(ScoredTransaction {
            verdict,
            features: row.features,
            unseen: row.unseen,
        })
    }

    /// Assemble and score a whole table. The batch either scores fully or
    /// is rejected.
    pub fn score_table(&self, table: &TransactionTable) -> Result<ScoredTable> {
        let start = Instant::now();

        let features = self
            .assembler
            .assemble_batch(table)
            .inspect_err(|e| self.record_error(e))?;
        let scored = self
            .scorer
            .annotate(&features)
            .inspect_err(|e| self.record_error(e))?
            .with_source(table);

        for row in scored.rows() {
            self.metrics.record_unseen(&row.row.unseen);
            self.metrics.record_verdict(row.verdict);
        }
        self.metrics.record_batch(start.elapsed());

        info!(
            rows = scored.len(),
            fraudulent = scored.fraudulent_count(),
            unseen_merchants = features.unseen_count(CategoricalField::Merchant),
            unseen_categories = features.unseen_count(CategoricalField::Category),
            unseen_genders = features.unseen_count(CategoricalField::Gender),
            "Batch scored"
        );

        Ok(scored)
    }

    fn record_error(&self, error: &ScoringError) {
        match error {
            ScoringError::Schema { missing } => {
                self.metrics.record_schema_rejection();
                warn!(missing = ?missing, "Batch rejected: missing required columns");
            }
            ScoringError::Validation(msg) => {
                self.metrics.record_validation_rejection();
                warn!(reason = %msg, "Transaction rejected");
            }
            ScoringError::ModelInvocation(_) => self.metrics.record_model_failure(),
            _ => {}
        }
    }
}
