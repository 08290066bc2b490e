//! Where a finished onboarding is sent.

use std::{sync::Arc, time::Duration};

use {
    async_trait::async_trait,
    porch_config::{Cents, SubmissionConfig},
    serde::Serialize,
    tracing::{debug, warn},
};

use crate::error::{Error, Result};

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(15);

/// A captured lead, as delivered to a [`LeadSink`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lead {
    pub business_name: String,
    pub founder_email: String,
    pub tier: String,
    /// Selected add-on ids, sorted.
    pub add_ons: Vec<String>,
    pub total: Cents,
}

/// Receives leads when a wizard is finalized.
#[async_trait]
pub trait LeadSink: Send + Sync {
    async fn submit(&self, lead: &Lead) -> Result<()>;
}

/// Stand-in backend: waits a fixed delay, then accepts every lead.
#[derive(Debug, Clone)]
pub struct SimulatedLeadSink {
    delay: Duration,
}

impl SimulatedLeadSink {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl LeadSink for SimulatedLeadSink {
    async fn submit(&self, lead: &Lead) -> Result<()> {
        debug!(tier = %lead.tier, delay = ?self.delay, "simulating lead submission");
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}

/// Posts each lead as JSON to a form/webhook endpoint.
#[derive(Debug, Clone)]
pub struct WebhookLeadSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookLeadSink {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), url)
    }

    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl LeadSink for WebhookLeadSink {
    async fn submit(&self, lead: &Lead) -> Result<()> {
        let resp = self
            .client
            .post(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(WEBHOOK_TIMEOUT)
            .json(lead)
            .send()
            .await
            .map_err(|e| Error::submission(format!("webhook request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(%status, url = %self.url, "lead webhook rejected submission");
            return Err(Error::submission(format!("webhook returned {status}: {body}")));
        }
        debug!(%status, "lead webhook accepted submission");
        Ok(())
    }
}

/// Pick the sink for `config`: the webhook when one is filled in, else the
/// simulated backend.
pub fn lead_sink_from_config(config: &SubmissionConfig) -> Arc<dyn LeadSink> {
    match config.live_webhook_url() {
        Some(url) => Arc::new(WebhookLeadSink::new(url)),
        None => Arc::new(SimulatedLeadSink::new(Duration::from_millis(config.delay_ms))),
    }
}

/// Checkout link for `lead`, with the founder email pre-filled.
///
/// Returns `None` when `checkout_url` is absent or not a valid URL.
pub fn checkout_link(checkout_url: Option<&str>, lead: &Lead) -> Option<String> {
    let mut url = url::Url::parse(checkout_url?).ok()?;
    if !lead.founder_email.is_empty() {
        url.query_pairs_mut()
            .append_pair("prefilled_email", &lead.founder_email);
    }
    Some(url.into())
}
