//! Webhook delivery with exponential-backoff retry.
//!
//! [`WebhookNotifier`] POSTs a JSON-encoded [`LoadCompletion`] to an external
//! URL. Failed attempts are retried with exponential backoff (1 s, 2 s, 4 s)
//! before a final attempt.

use std::time::Duration;

use async_trait::async_trait;

use crate::notifier::{CompletionNotifier, LoadCompletion, NotifyError, EVENT_LOAD_COMPLETED};

/// Retry delays (exponential backoff: 1s, 2s, 4s).
const RETRY_DELAYS: [Duration; 3] = [
    Duration::from_secs(1),
    Duration::from_secs(2),
    Duration::from_secs(4),
];

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for webhook delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server returned a non-2xx status code.
    #[error("Webhook returned HTTP {0}")]
    HttpStatus(u16),
}

// ---------------------------------------------------------------------------
// WebhookNotifier
// ---------------------------------------------------------------------------

/// Delivers load completions to an external webhook endpoint.
#[derive(Debug)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    retry_delays: Vec<Duration>,
}

impl WebhookNotifier {
    /// Create a notifier for `url` with the default backoff schedule.
    pub fn new(url: impl Into<String>) -> Result<Self, WebhookError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
            retry_delays: RETRY_DELAYS.to_vec(),
        })
    }

    /// Replace the backoff schedule. An empty schedule means one attempt.
    pub fn with_retry_delays(mut self, delays: Vec<Duration>) -> Self {
        self.retry_delays = delays;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Deliver a completion with retry.
    ///
    /// Returns `Ok(())` on the first successful attempt.
    pub async fn deliver(&self, completion: &LoadCompletion) -> Result<(), WebhookError> {
        let payload = serde_json::json!({
            "event_type": EVENT_LOAD_COMPLETED,
            "loadId": completion.load_id,
            "scannedCount": completion.scanned_count,
            "expectedCount": completion.expected_count,
            "timestamp": chrono::Utc::now(),
        });

        for (attempt, delay) in self.retry_delays.iter().enumerate() {
            match self.try_send(&payload).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        url = %self.url,
                        error = %e,
                        "Webhook delivery attempt failed, retrying"
                    );
                    tokio::time::sleep(*delay).await;
                }
            }
        }

        // Final attempt after the last backoff.
        self.try_send(&payload).await.inspect_err(|e| {
            tracing::error!(url = %self.url, error = %e, "Webhook delivery failed after all retries");
        })
    }

    /// Execute a single POST request and check the response status.
    async fn try_send(&self, payload: &serde_json::Value) -> Result<(), WebhookError> {
        let response = self.client.post(&self.url).json(payload).send().await?;
        if !response.status().is_success() {
            return Err(WebhookError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl CompletionNotifier for WebhookNotifier {
    async fn notify_load_complete(&self, completion: &LoadCompletion) -> Result<(), NotifyError> {
        Ok(self.deliver(completion).await?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
