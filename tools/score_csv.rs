//! Batch CSV Scorer
//!
//! Scores every row of a transaction CSV and writes the annotated table with
//! a trailing `Prediction` column.
//!
//! Usage: score_csv <input.csv> [output.csv] [config.toml]

use anyhow::Context;
use fraud_scoring_pipeline::{
    batch::REQUIRED_COLUMNS,
    config::AppConfig,
    metrics::PipelineMetrics,
    pipeline::{FraudPipeline, ScoringContext},
    ScoringError, TransactionTable,
};
use std::fs::File;
use std::io::BufWriter;
use std::sync::Arc;
use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("score_csv=info".parse()?)
                .add_directive("fraud_scoring_pipeline=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let Some(input) = args.get(1) else {
        anyhow::bail!("usage: score_csv <input.csv> [output.csv] [config.toml]");
    };
    let output = args.get(2).map(|s| s.as_str()).unwrap_or("predictions.csv");
    let config = match args.get(3) {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };

    info!(input = %input, output = %output, "Scoring batch");

    let context = ScoringContext::load(&config.models)?;
    let metrics = Arc::new(PipelineMetrics::new());
    let pipeline = FraudPipeline::new(&context, metrics.clone());

    let table = TransactionTable::from_path(input).with_context(|| format!("Failed to read {}", input))?;

    // Nothing is written unless the whole batch scores
    let scored = match pipeline.score_table(&table) {
        Ok(scored) => scored,
        Err(ScoringError::Schema { missing }) => {
            error!(
                missing = %missing.join(", "),
                "CSV must contain columns: {}",
                REQUIRED_COLUMNS.join(", ")
            );
            return Err(ScoringError::Schema { missing }.into());
        }
        Err(e) => return Err(e.into()),
    };

    let writer = BufWriter::new(File::create(output).with_context(|| format!("Failed to create {}", output))?);
    scored.write_csv(writer)?;

    info!(
        rows = scored.len(),
        fraudulent = scored.fraudulent_count(),
        output = %output,
        "Batch prediction complete"
    );
    metrics.print_summary();

    Ok(())
}
