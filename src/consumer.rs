//! NATS intake for transactions to score

use crate::types::failure::ScoringFailure;
use crate::types::transaction::Transaction;
use anyhow::Result;
use async_nats::{Client, Subscriber};
use tracing::info;

/// Subscribes to the transaction subject, optionally as part of a queue
/// group so several scorers split the stream.
pub struct TransactionConsumer {
    client: Client,
    subject: String,
    queue_group: Option<String>,
}

impl TransactionConsumer {
    pub fn new(client: Client, subject: &str, queue_group: Option<String>) -> Self {
        Self {
            client,
            subject: subject.to_string(),
            queue_group,
        }
    }

    pub async fn subscribe(&self) -> Result<Subscriber> {
        let subscriber = match &self.queue_group {
            Some(group) => {
                self.client
                    .queue_subscribe(self.subject.clone(), group.clone())
                    .await?
            }
            None => self.client.subscribe(self.subject.clone()).await?,
        };
        info!(
            subject = %self.subject,
            queue_group = self.queue_group.as_deref().unwrap_or("-"),
            "Subscribed to transaction subject"
        );
        Ok(subscriber)
    }

    /// Decode a message payload; the error is ready to send back to the
    /// requester.
    pub fn decode(payload: &[u8]) -> std::result::Result<Transaction, ScoringFailure> {
        serde_json::from_slice(payload).map_err(|e| ScoringFailure::invalid_payload(payload, &e))
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}
