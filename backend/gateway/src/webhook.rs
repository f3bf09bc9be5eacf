//! Review-needed webhook.
//!
//! Posts the record JSON to a configured URL from a detached task. Delivery
//! failures are logged and never reach the HTTP caller.

use std::time::Duration;

use anyhow::{Context, Result};
use chequeforge_store::ChequeRecord;
use tokio::task::JoinHandle;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            timeout,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Deliver one record, waiting for the receiver's answer.
    pub async fn send(&self, record: &ChequeRecord) -> Result<()> {
        self.client
            .post(&self.url)
            .timeout(self.timeout)
            .json(record)
            .send()
            .await
            .with_context(|| format!("webhook POST to {} failed", self.url))?
            .error_for_status()
            .context("webhook receiver rejected the record")?;
        Ok(())
    }

    /// Fire-and-forget delivery.
    pub fn notify(&self, record: ChequeRecord) -> JoinHandle<()> {
        let notifier = self.clone();
        tokio::spawn(async move {
            match notifier.send(&record).await {
                Ok(()) => info!(id = %record.id, "Review webhook delivered"),
                Err(e) => warn!(id = %record.id, error = %format!("{e:#}"), "Review webhook failed"),
            }
        })
    }
}
