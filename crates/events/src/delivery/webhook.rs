//! Chat webhook delivery (Discord-compatible embeds).
//!
//! [`WebhookDelivery`] POSTs a JSON-encoded [`ChatMessage`] to the configured
//! webhook URL. Each request carries the payload's own timeout (10 s for
//! single alerts, 15 s for reports). There is no retry.

use async_trait::async_trait;

use crate::delivery::{ChannelTransport, SendOutcome, TransportError};
use crate::payload::{ChatMessage, NotificationPayload};

/// Number of URL characters kept by [`WebhookDelivery::masked_url`].
const MASKED_URL_PREFIX: usize = 20;

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
// WebhookDelivery
// ---------------------------------------------------------------------------

/// Delivers chat messages to a single webhook endpoint.
pub struct WebhookDelivery {
    client: reqwest::Client,
    url: Option<String>,
}

impl WebhookDelivery {
    /// Create a delivery service. `None` or an empty URL leaves the
    /// transport unconfigured.
    pub fn new(url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.filter(|u| !u.trim().is_empty()),
        }
    }

    /// The first characters of the configured URL, safe to show in the UI.
    pub fn masked_url(&self) -> Option<String> {
        self.url.as_deref().map(|url| {
            let prefix: String = url.chars().take(MASKED_URL_PREFIX).collect();
            format!("{prefix}...")
        })
    }

    /// Execute a single POST request and check the response status.
    async fn post(
        &self,
        url: &str,
        message: &ChatMessage,
        payload: &NotificationPayload,
    ) -> Result<(), WebhookError> {
        let response = self
            .client
            .post(url)
            .timeout(payload.timeout())
            .json(message)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %body, "Webhook rejected message");
            return Err(WebhookError::HttpStatus(status.as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelTransport for WebhookDelivery {
    fn name(&self) -> &'static str {
        "discord"
    }

    fn is_configured(&self) -> bool {
        self.url.is_some()
    }

    async fn send(&self, payload: &NotificationPayload) -> Result<SendOutcome, TransportError> {
        let message = match payload {
            NotificationPayload::ChatAlert(m) | NotificationPayload::ChatReport(m) => m,
            other => {
                return Err(TransportError::UnsupportedPayload {
                    transport: self.name(),
                    payload: other.kind(),
                })
            }
        };

        let Some(url) = self.url.as_deref() else {
            tracing::warn!("Discord webhook URL not configured");
            return Ok(SendOutcome::NotConfigured);
        };

        self.post(url, message, payload).await?;
        tracing::info!(kind = payload.kind(), "Discord notification sent");
        Ok(SendOutcome::Delivered)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
