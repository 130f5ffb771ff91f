//! Scoring metrics and periodic summaries.

use crate::encoder::CategoricalField;
use crate::types::verdict::Verdict;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for the scoring pipeline
pub struct PipelineMetrics {
    /// Rows scored, single and batch
    pub transactions_scored: AtomicU64,
    pub fraudulent: AtomicU64,
    pub legitimate: AtomicU64,
    /// Batch tables scored
    pub batches_scored: AtomicU64,
    /// Batches rejected for missing columns
    pub schema_rejections: AtomicU64,
    /// Requests rejected for missing or non-numeric fields
    pub validation_rejections: AtomicU64,
    pub model_failures: AtomicU64,
    /// Unseen-label fallbacks per categorical field
    unseen_by_field: RwLock<HashMap<&'static str, u64>>,
    /// Single-transaction scoring times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Whole-batch scoring times (in microseconds)
    batch_times: RwLock<Vec<u64>>,
    start_time: Instant,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            transactions_scored: AtomicU64::new(0),
            fraudulent: AtomicU64::new(0),
            legitimate: AtomicU64::new(0),
            batches_scored: AtomicU64::new(0),
            schema_rejections: AtomicU64::new(0),
            validation_rejections: AtomicU64::new(0),
            model_failures: AtomicU64::new(0),
            unseen_by_field: RwLock::new(HashMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            batch_times: RwLock::new(Vec::new()),
            start_time: Instant::now(),
        }
    }

    /// Record one scored row
    pub fn record_verdict(&self, verdict: Verdict) {
        self.transactions_scored.fetch_add(1, Ordering::Relaxed);
        match verdict {
            Verdict::Fraudulent => self.fraudulent.fetch_add(1, Ordering::Relaxed),
            Verdict::Legitimate => self.legitimate.fetch_add(1, Ordering::Relaxed),
        };
    }

    /// Record wall time of one single-transaction scoring call
    pub fn record_processing_time(&self, processing_time: Duration) {
        push_sample(&self.processing_times, processing_time);
    }

    /// Record one scored batch and its wall time
    pub fn record_batch(&self, batch_time: Duration) {
        self.batches_scored.fetch_add(1, Ordering::Relaxed);
        push_sample(&self.batch_times, batch_time);
    }

    pub fn record_unseen(&self, fields: &[CategoricalField]) {
        if fields.is_empty() {
            return;
        }
        if let Ok(mut by_field) = self.unseen_by_field.write() {
            for field in fields {
                *by_field.entry(field.as_str()).or_insert(0) += 1;
            }
        }
    }

    pub fn record_schema_rejection(&self) {
        self.schema_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_validation_rejection(&self) {
        self.validation_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_model_failure(&self) {
        self.model_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Unseen-label fallbacks recorded for a field
    pub fn unseen_count(&self, field: CategoricalField) -> u64 {
        self.unseen_by_field
            .read()
            .map(|by_field| by_field.get(field.as_str()).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Get single-transaction processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        ProcessingStats::from_samples(&self.processing_times)
    }

    /// Get whole-batch processing time statistics
    pub fn get_batch_stats(&self) -> ProcessingStats {
        ProcessingStats::from_samples(&self.batch_times)
    }

    /// Rows scored per second since start
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.transactions_scored.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let scored = self.transactions_scored.load(Ordering::Relaxed);
        let fraudulent = self.fraudulent.load(Ordering::Relaxed);
        let fraud_rate = if scored > 0 {
            (fraudulent as f64 / scored as f64) * 100.0
        } else {
            0.0
        };
        let processing = self.get_processing_stats();
        let batches = self.get_batch_stats();

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║            FRAUD SCORING PIPELINE - METRICS SUMMARY          ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Transactions Scored:    {:>8}  │  Throughput: {:>6.1} tx/s ║",
            scored,
            self.get_throughput()
        );
        info!(
            "║ Fraudulent:             {:>8}  │  Fraud Rate: {:>6.1}%     ║",
            fraudulent, fraud_rate
        );
        info!(
            "║ Batches: {:>6}  Schema rejects: {:>6}  Invalid: {:>6}      ║",
            self.batches_scored.load(Ordering::Relaxed),
            self.schema_rejections.load(Ordering::Relaxed),
            self.validation_rejections.load(Ordering::Relaxed)
        );
        info!(
            "║ Model failures: {:>6}                                       ║",
            self.model_failures.load(Ordering::Relaxed)
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Scoring Time (μs): mean={:>5} p50={:>5} p95={:>5} p99={:>5}    ║",
            processing.mean_us, processing.p50_us, processing.p95_us, processing.p99_us
        );
        info!(
            "║ Batch Time (μs):   mean={:>7} p50={:>7} max={:>7}         ║",
            batches.mean_us, batches.p50_us, batches.max_us
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Unseen Labels (scored as -1):                                ║");
        for field in CategoricalField::ALL {
            info!("║   {:10}: {:>8}                                         ║", field.as_str(), self.unseen_count(field));
        }
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

fn push_sample(series: &RwLock<Vec<u64>>, elapsed: Duration) {
    if let Ok(mut times) = series.write() {
        times.push(elapsed.as_micros() as u64);
        // Keep only last 10000
        if times.len() > 10000 {
            times.drain(0..5000);
        }
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

impl ProcessingStats {
    fn from_samples(series: &RwLock<Vec<u64>>) -> Self {
        let Ok(times) = series.read() else {
            return Self::default();
        };
        if times.is_empty() {
            return Self::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        Self {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: *sorted.last().unwrap_or(&0),
        }
    }
}

/// Prints a metrics summary at a fixed interval
pub struct MetricsReporter {
    metrics: Arc<PipelineMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<PipelineMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs.max(1)));
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_counts() {
        let metrics = PipelineMetrics::new();

        metrics.record_verdict(Verdict::Fraudulent);
        metrics.record_verdict(Verdict::Legitimate);
        metrics.record_verdict(Verdict::Legitimate);

        assert_eq!(metrics.transactions_scored.load(Ordering::Relaxed), 3);
        assert_eq!(metrics.fraudulent.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.legitimate.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_unseen_counts_per_field() {
        let metrics = PipelineMetrics::new();

        metrics.record_unseen(&[CategoricalField::Merchant]);
        metrics.record_unseen(&[CategoricalField::Merchant, CategoricalField::Gender]);
        metrics.record_unseen(&[]);

        assert_eq!(metrics.unseen_count(CategoricalField::Merchant), 2);
        assert_eq!(metrics.unseen_count(CategoricalField::Gender), 1);
        assert_eq!(metrics.unseen_count(CategoricalField::Category), 0);
    }

    #[test]
    fn test_processing_stats() {
        let metrics = PipelineMetrics::new();
        assert_eq!(metrics.get_processing_stats().count, 0);

        metrics.record_processing_time(Duration::from_micros(100));
        metrics.record_processing_time(Duration::from_micros(300));

        let stats = metrics.get_processing_stats();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.mean_us, 200);
        assert_eq!(stats.max_us, 300);
    }

    #[test]
    fn test_batch_times_kept_apart_from_transaction_times() {
        let metrics = PipelineMetrics::new();

        metrics.record_processing_time(Duration::from_micros(100));
        metrics.record_processing_time(Duration::from_micros(120));
        metrics.record_batch(Duration::from_micros(50_000));

        let single = metrics.get_processing_stats();
        assert_eq!(single.count, 2);
        assert_eq!(single.max_us, 120);

        let batches = metrics.get_batch_stats();
        assert_eq!(batches.count, 1);
        assert_eq!(batches.mean_us, 50_000);
        assert_eq!(metrics.batches_scored.load(Ordering::Relaxed), 1);
    }
}
