//! External delivery channels for stock notifications.
//!
//! Every transport implements [`ChannelTransport`]: it accepts a
//! [`NotificationPayload`], enforces the payload's timeout, and reports
//! either delivery, a "not configured" state, or a [`TransportError`].
//! Transports never retry; that is the caller's decision.

use async_trait::async_trait;

use crate::payload::NotificationPayload;

pub mod email;
pub mod ingress;
pub mod webhook;

/// Successful result of a send attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The remote endpoint accepted the payload.
    Delivered,
    /// No endpoint or credentials are configured; nothing was sent.
    NotConfigured,
}

/// Error type shared by all transports.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error(transparent)]
    Webhook(#[from] webhook::WebhookError),

    #[error(transparent)]
    Email(#[from] email::EmailError),

    /// The payload variant cannot travel over this transport.
    #[error("{transport} transport cannot deliver {payload} payloads")]
    UnsupportedPayload {
        transport: &'static str,
        payload: &'static str,
    },
}

/// A single outbound notification medium.
#[async_trait]
pub trait ChannelTransport: Send + Sync {
    /// Human-readable transport name (e.g. `"discord"`, `"email"`).
    fn name(&self) -> &'static str;

    /// Whether an endpoint / credentials are present.
    fn is_configured(&self) -> bool;

    /// Attempt delivery once, bounded by [`NotificationPayload::timeout`].
    async fn send(&self, payload: &NotificationPayload) -> Result<SendOutcome, TransportError>;
}
