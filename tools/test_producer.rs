//! Test Transaction Producer
//!
//! Generates and publishes synthetic card transactions to NATS for pipeline
//! testing. A share of the merchants is deliberately absent from the shipped
//! encoder vocabulary to exercise the unseen-label path.
//!
//! Usage: test_producer [nats_url] [subject] [count] [fraud_rate] [delay_ms]

use chrono::{Datelike, Timelike, Utc};
use fraud_scoring_pipeline::Transaction;
use rand::Rng;
use std::time::Duration;
use tracing::{info, warn};

const KNOWN_MERCHANTS: [&str; 2] = ["BigBox", "QuickMart"];
const SUSPICIOUS_MERCHANTS: [&str; 2] = ["fraud_Kirlin and Sons", "fraud_Rippin, Kub and Mann"];
const NOVEL_MERCHANTS: [&str; 3] = ["Corner Deli", "Harbor Books", "Night Owl Vapes"];

/// Transaction generator for testing
struct TransactionGenerator {
    rng: rand::rngs::ThreadRng,
    transaction_counter: u64,
}

impl TransactionGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            transaction_counter: 0,
        }
    }

    fn card_number(&mut self) -> String {
        format!("4{:015}", self.rng.gen_range(0..1_000_000_000_000_000u64))
    }

    /// Generate a typical in-town purchase
    fn generate_legitimate(&mut self) -> Transaction {
        self.transaction_counter += 1;
        let now = Utc::now();
        let (lat, long) = (self.rng.gen_range(25.0..48.0), self.rng.gen_range(-122.0..-70.0));

        let merchant = if self.rng.gen_bool(0.1) {
            self.random_choice(&NOVEL_MERCHANTS)
        } else {
            self.random_choice(&KNOWN_MERCHANTS)
        };

        Transaction {
            transaction_id: Some(format!("tx_{:012}", self.transaction_counter)),
            merchant: merchant.to_string(),
            category: self
                .random_choice(&["grocery", "grocery_pos", "gas_transport", "entertainment"])
                .to_string(),
            amt: self.rng.gen_range(5.0..150.0),
            lat,
            long,
            merch_lat: lat + self.rng.gen_range(-0.05..0.05),
            merch_long: long + self.rng.gen_range(-0.05..0.05),
            hour: now.hour(),
            day: now.day(),
            month: now.month(),
            gender: self.random_choice(&["F", "M"]).to_string(),
            cc_num: self.card_number(),
        }
    }

    /// Generate a suspicious late-night, far-away, online purchase
    fn generate_suspicious(&mut self) -> Transaction {
        self.transaction_counter += 1;
        let now = Utc::now();
        let (lat, long) = (self.rng.gen_range(25.0..48.0), self.rng.gen_range(-122.0..-70.0));

        Transaction {
            transaction_id: Some(format!("tx_{:012}", self.transaction_counter)),
            merchant: self.random_choice(&SUSPICIOUS_MERCHANTS).to_string(),
            category: self.random_choice(&["misc_net", "shopping_net"]).to_string(),
            amt: self.rng.gen_range(500.0..2500.0), // High amount
            lat,
            long,
            merch_lat: lat + self.rng.gen_range(-1.0..1.0), // Up to ~100 km away
            merch_long: long + self.rng.gen_range(-1.0..1.0),
            hour: self.rng.gen_range(0..4), // Night time
            day: now.day(),
            month: now.month(),
            gender: self.random_choice(&["F", "M"]).to_string(),
            cc_num: self.card_number(),
        }
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("test_producer=info".parse()?),
        )
        .init();

    info!("Starting Test Transaction Producer");

    let args: Vec<String> = std::env::args().collect();
    let nats_url = args.get(1).map(|s| s.as_str()).unwrap_or("nats://localhost:4222");
    let subject = args.get(2).map(|s| s.as_str()).unwrap_or("transactions");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(100);
    let fraud_rate: f64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(0.1);
    let delay_ms: u64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        fraud_rate = fraud_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            return run_dry_mode(count, fraud_rate, delay_ms).await;
        }
    };

    let mut generator = TransactionGenerator::new();
    let mut rng = rand::thread_rng();

    info!("Starting to publish {} transactions...", count);

    let mut legitimate_count = 0;
    let mut suspicious_count = 0;

    for i in 0..count {
        let transaction = if rng.gen_bool(fraud_rate) {
            suspicious_count += 1;
            generator.generate_suspicious()
        } else {
            legitimate_count += 1;
            generator.generate_legitimate()
        };

        let payload = serde_json::to_vec(&transaction)?;

        client.publish(subject.to_string(), payload.into()).await?;

        if (i + 1) % 10 == 0 {
            info!(
                "Published {}/{} transactions ({} legitimate, {} suspicious)",
                i + 1,
                count,
                legitimate_count,
                suspicious_count
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    client.flush().await?;

    info!(
        "Completed! Published {} transactions ({} legitimate, {} suspicious)",
        count, legitimate_count, suspicious_count
    );

    Ok(())
}

async fn run_dry_mode(count: u64, fraud_rate: f64, delay_ms: u64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no NATS connection)");

    let mut generator = TransactionGenerator::new();
    let mut rng = rand::thread_rng();

    for i in 0..count {
        let transaction = if rng.gen_bool(fraud_rate) {
            generator.generate_suspicious()
        } else {
            generator.generate_legitimate()
        };

        let json = serde_json::to_string_pretty(&transaction)?;

        if (i + 1) % 10 == 0 || i == 0 {
            info!("Sample transaction {}:\n{}", i + 1, json);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
