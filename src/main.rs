//! Fraud Scoring Pipeline - Main Entry Point
//!
//! Consumes transactions from NATS, scores them with the loaded classifier,
//! and publishes a verdict for each one.

use anyhow::Result;
use fraud_scoring_pipeline::{
    config::{AppConfig, LoggingConfig},
    consumer::TransactionConsumer,
    metrics::{MetricsReporter, PipelineMetrics},
    pipeline::{FraudPipeline, ScoringContext},
    producer::VerdictProducer,
    ScoringFailure, VerdictMessage,
};
use futures::StreamExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("fraud_scoring_pipeline={}", logging.level).parse()?);

    if logging.format == "json" {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

/// Tell a waiting requester why it gets no verdict.
async fn reply_with_failure(producer: &VerdictProducer, failure: &ScoringFailure, reply: Option<&str>) {
    let Some(reply) = reply else {
        return;
    };
    if let Err(e) = producer.reply_failure(failure, reply).await {
        error!(
            failure_id = %failure.failure_id,
            error = %e,
            "Failed to reply with scoring failure"
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    init_logging(&config.logging)?;

    info!("Starting Fraud Scoring Pipeline");

    let context = ScoringContext::load(&config.models)?;
    info!(
        model = %context.classifier.name(),
        "Model and encoders loaded"
    );

    let metrics = Arc::new(PipelineMetrics::new());
    let pipeline = Arc::new(FraudPipeline::new(&context, metrics.clone()));
    info!(
        "Feature assembler initialized ({} features: {})",
        pipeline.assembler().feature_count(),
        pipeline.assembler().feature_names().join(", ")
    );

    let client = async_nats::connect(&config.nats.url).await?;
    info!("Connected to NATS at {}", config.nats.url);

    let consumer = TransactionConsumer::new(
        client.clone(),
        &config.nats.transaction_subject,
        config.nats.queue_group.clone(),
    );
    let producer = Arc::new(VerdictProducer::new(client.clone(), &config.nats.verdict_subject));

    let num_workers = config.pipeline.workers.max(1);
    info!(
        workers = num_workers,
        listen = %consumer.subject(),
        publish = %producer.subject(),
        "Starting transaction scoring loop"
    );

    let semaphore = Arc::new(Semaphore::new(num_workers));
    let processed_count = Arc::new(AtomicU64::new(0));

    let reporter = MetricsReporter::new(metrics.clone(), config.pipeline.metrics_interval_secs);
    tokio::spawn(reporter.start());

    let mut subscription = consumer.subscribe().await?;

    while let Some(message) = subscription.next().await {
        let permit = semaphore.clone().acquire_owned().await?;

        let pipeline = pipeline.clone();
        let producer = producer.clone();
        let processed_count = processed_count.clone();

        tokio::spawn(async move {
            let reply = message.reply.as_ref().map(|r| r.as_str());

            let transaction = match TransactionConsumer::decode(&message.payload) {
                Ok(tx) => tx,
                Err(failure) => {
                    warn!(error = %failure.error, "Failed to deserialize transaction");
                    reply_with_failure(&producer, &failure, reply).await;
                    return;
                }
            };

            match pipeline.score_transaction(&transaction) {
                Ok(scored) => {
                    let unseen = scored.unseen.iter().map(|f| f.to_string()).collect();
                    let verdict = VerdictMessage::new(transaction.transaction_id.clone(), scored.verdict)
                        .with_unseen_fields(unseen);

                    if let Err(e) = producer.publish(&verdict, reply).await {
                        error!(
                            verdict_id = %verdict.verdict_id,
                            error = %e,
                            "Failed to publish verdict"
                        );
                    }
                }
                Err(e) => {
                    warn!(
                        transaction_id = transaction.transaction_id.as_deref().unwrap_or("-"),
                        error = %e,
                        "Transaction not scored"
                    );
                    let failure = ScoringFailure::from_error(transaction.transaction_id.clone(), &e);
                    reply_with_failure(&producer, &failure, reply).await;
                }
            }

            let count = processed_count.fetch_add(1, Ordering::Relaxed) + 1;
            if count % 100 == 0 {
                let stats = pipeline.metrics().get_processing_stats();
                info!(
                    processed = count,
                    throughput = format!("{:.1} tx/s", pipeline.metrics().get_throughput()),
                    avg_latency_us = stats.mean_us,
                    "Processing milestone"
                );
            }

            drop(permit);
        });
    }

    info!("Pipeline shutting down...");
    metrics.print_summary();

    Ok(())
}
