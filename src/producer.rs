//! NATS publisher for scoring verdicts

use crate::types::failure::ScoringFailure;
use crate::types::verdict::VerdictMessage;
use anyhow::Result;
use async_nats::Client;
use tracing::debug;

/// Publishes verdicts to the configured subject
#[derive(Clone)]
pub struct VerdictProducer {
    client: Client,
    subject: String,
}

impl VerdictProducer {
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Publish a verdict, and also answer the request inbox when the
    /// transaction was sent as a request.
    pub async fn publish(&self, message: &VerdictMessage, reply: Option<&str>) -> Result<()> {
        let payload = serde_json::to_vec(message)?;

        self.client
            .publish(self.subject.clone(), payload.clone().into())
            .await?;

        if let Some(reply) = reply {
            self.client.publish(reply.to_string(), payload.into()).await?;
        }

        debug!(
            verdict_id = %message.verdict_id,
            transaction_id = message.transaction_id.as_deref().unwrap_or("-"),
            verdict = %message.verdict,
            "Published verdict"
        );

        Ok(())
    }

    /// Answer a request inbox with the reason no verdict was produced.
    pub async fn reply_failure(&self, failure: &ScoringFailure, reply: &str) -> Result<()> {
        let payload = serde_json::to_vec(failure)?;
        self.client.publish(reply.to_string(), payload.into()).await?;

        debug!(
            failure_id = %failure.failure_id,
            transaction_id = failure.transaction_id.as_deref().unwrap_or("-"),
            kind = ?failure.kind,
            "Replied with scoring failure"
        );

        Ok(())
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}
