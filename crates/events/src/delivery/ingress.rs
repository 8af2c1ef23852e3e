//! Worker ingress forwarding.
//!
//! [`WorkerIngress`] posts [`IngestEvent`]s to an external collector
//! (`WORKER_INGRESS_URL`), authenticated with a shared-secret header.
//! An unset URL makes every send a silent no-op.

use async_trait::async_trait;

use crate::delivery::webhook::WebhookError;
use crate::delivery::{ChannelTransport, SendOutcome, TransportError};
use crate::payload::NotificationPayload;

/// Header carrying the shared secret expected by the worker.
pub const SHARED_SECRET_HEADER: &str = "x-shared-secret";

/// Forwards stock events to the worker ingress endpoint.
pub struct WorkerIngress {
    client: reqwest::Client,
    url: Option<String>,
    shared_secret: String,
}

impl WorkerIngress {
    pub fn new(url: Option<String>, shared_secret: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.filter(|u| !u.trim().is_empty()),
            shared_secret: shared_secret.into(),
        }
    }
}

#[async_trait]
impl ChannelTransport for WorkerIngress {
    fn name(&self) -> &'static str {
        "worker_ingress"
    }

    fn is_configured(&self) -> bool {
        self.url.is_some()
    }

    async fn send(&self, payload: &NotificationPayload) -> Result<SendOutcome, TransportError> {
        let NotificationPayload::Ingest(event) = payload else {
            return Err(TransportError::UnsupportedPayload {
                transport: self.name(),
                payload: payload.kind(),
            });
        };

        let Some(url) = self.url.as_deref() else {
            return Ok(SendOutcome::NotConfigured);
        };

        let response = self
            .client
            .post(url)
            .timeout(payload.timeout())
            .header(SHARED_SECRET_HEADER, &self.shared_secret)
            .json(event)
            .send()
            .await
            .map_err(WebhookError::from)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "<no-body>".into());
            tracing::error!(status = status.as_u16(), body = %body, "Worker ingress error");
            return Err(WebhookError::HttpStatus(status.as_u16()).into());
        }

        tracing::debug!(product_id = event.data.product_id, "Stock event forwarded to worker");
        Ok(SendOutcome::Delivered)
    }
}
