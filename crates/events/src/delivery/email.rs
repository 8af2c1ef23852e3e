//! Email report delivery via SMTP.
//!
//! [`EmailDelivery`] wraps the `lettre` async SMTP transport to send
//! low-stock reports as a plain-text body with an HTML alternative.
//! Configuration is loaded from environment variables; if `SMTP_HOST` is not
//! set, [`EmailConfig::from_env`] returns `None` and every send reports
//! [`SendOutcome::NotConfigured`].

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::delivery::{ChannelTransport, SendOutcome, TransportError};
use crate::payload::{EmailReport, NotificationPayload};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),

    /// The SMTP exchange did not finish in time.
    #[error("SMTP delivery timed out after {0}s")]
    Timeout(u64),
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "inventory@stockwatch.local";

/// Configuration for the SMTP email delivery service.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP server hostname.
    pub smtp_host: String,
    /// SMTP server port (defaults to 587).
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    /// Optional SMTP username.
    pub smtp_user: Option<String>,
    /// Optional SMTP password.
    pub smtp_password: Option<String>,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set, signalling that email
    /// delivery is not configured.
    ///
    /// | Variable        | Required | Default                      |
    /// |-----------------|----------|------------------------------|
    /// | `SMTP_HOST`     | yes      | none                         |
    /// | `SMTP_PORT`     | no       | `587`                        |
    /// | `SMTP_FROM`     | no       | `inventory@stockwatch.local` |
    /// | `SMTP_USER`     | no       | none                         |
    /// | `SMTP_PASSWORD` | no       | none                         |
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let smtp_host = lookup("SMTP_HOST").filter(|h| !h.trim().is_empty())?;
        Some(Self {
            smtp_host,
            smtp_port: lookup("SMTP_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: lookup("SMTP_FROM")
                .unwrap_or_else(|| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: lookup("SMTP_USER"),
            smtp_password: lookup("SMTP_PASSWORD"),
        })
    }
}

// ---------------------------------------------------------------------------
// EmailDelivery
// ---------------------------------------------------------------------------

/// Sends email reports via SMTP.
pub struct EmailDelivery {
    config: Option<EmailConfig>,
}

impl EmailDelivery {
    /// Create a delivery service; `None` leaves the transport unconfigured.
    pub fn new(config: Option<EmailConfig>) -> Self {
        Self { config }
    }

    /// Assemble the MIME message for `report`.
    fn build_message(config: &EmailConfig, report: &EmailReport) -> Result<Message, EmailError> {
        let mut builder = Message::builder()
            .from(config.from_address.parse::<Mailbox>()?)
            .subject(report.subject.clone());

        for recipient in &report.recipients {
            builder = builder.to(recipient.parse::<Mailbox>()?);
        }

        builder
            .multipart(MultiPart::alternative_plain_html(
                report.render_text(),
                report.render_html(),
            ))
            .map_err(|e| EmailError::Build(e.to_string()))
    }

    async fn deliver(
        &self,
        config: &EmailConfig,
        report: &EmailReport,
        timeout: Duration,
    ) -> Result<(), EmailError> {
        let email = Self::build_message(config, report)?;

        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
                .port(config.smtp_port)
                .timeout(Some(timeout));

        if let (Some(user), Some(pass)) = (&config.smtp_user, &config.smtp_password) {
            transport_builder =
                transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        let mailer = transport_builder.build();
        tokio::time::timeout(timeout, mailer.send(email))
            .await
            .map_err(|_| EmailError::Timeout(timeout.as_secs()))??;

        tracing::info!(
            recipients = report.recipients.len(),
            items = report.data.total_items,
            "Email report sent"
        );
        Ok(())
    }
}

#[async_trait]
impl ChannelTransport for EmailDelivery {
    fn name(&self) -> &'static str {
        "email"
    }

    fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    async fn send(&self, payload: &NotificationPayload) -> Result<SendOutcome, TransportError> {
        let NotificationPayload::Email(report) = payload else {
            return Err(TransportError::UnsupportedPayload {
                transport: self.name(),
                payload: payload.kind(),
            });
        };

        let Some(config) = self.config.as_ref() else {
            tracing::warn!("SMTP not configured, email report skipped");
            return Ok(SendOutcome::NotConfigured);
        };

        self.deliver(config, report, payload.timeout()).await?;
        Ok(SendOutcome::Delivered)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Utc;

    use super::*;

    fn config() -> EmailConfig {
        EmailConfig {
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: DEFAULT_SMTP_PORT,
            from_address: DEFAULT_FROM_ADDRESS.to_string(),
            smtp_user: None,
            smtp_password: None,
        }
    }

    fn lookup_from<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn config_is_absent_without_smtp_host() {
        assert!(EmailConfig::from_lookup(lookup_from(&[])).is_none());
        assert!(EmailConfig::from_lookup(lookup_from(&[("SMTP_HOST", "  ")])).is_none());
    }

    #[test]
    fn config_applies_defaults() {
        let config = EmailConfig::from_lookup(lookup_from(&[
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_PORT", "not-a-port"),
        ]))
        .unwrap();

        assert_eq!(config.smtp_host, "smtp.example.com");
        assert_eq!(config.smtp_port, DEFAULT_SMTP_PORT);
        assert_eq!(config.from_address, DEFAULT_FROM_ADDRESS);
        assert!(config.smtp_user.is_none());
    }

    #[test]
    fn config_reads_every_variable() {
        let config = EmailConfig::from_lookup(lookup_from(&[
            ("SMTP_HOST", "mail.local"),
            ("SMTP_PORT", "2525"),
            ("SMTP_FROM", "stock@mail.local"),
            ("SMTP_USER", "bot"),
            ("SMTP_PASSWORD", "pw"),
        ]))
        .unwrap();

        assert_eq!(config.smtp_port, 2525);
        assert_eq!(config.from_address, "stock@mail.local");
        assert_eq!(config.smtp_user.as_deref(), Some("bot"));
        assert_eq!(config.smtp_password.as_deref(), Some("pw"));
    }

    #[test]
    fn email_error_display_build() {
        let err = EmailError::Build("missing body".to_string());
        assert_eq!(err.to_string(), "Email build error: missing body");
    }

    #[test]
    fn builds_message_for_every_recipient() {
        let mut report = EmailReport::sample("a@example.com", Utc::now());
        report.recipients.push("b@example.com".to_string());

        let message = EmailDelivery::build_message(&config(), &report).unwrap();
        let to: Vec<String> = message
            .envelope()
            .to()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(to, vec!["a@example.com", "b@example.com"]);
    }

    #[test]
    fn unparseable_recipient_is_address_error() {
        let report = EmailReport::sample("not-an-email", Utc::now());
        assert_matches!(
            EmailDelivery::build_message(&config(), &report),
            Err(EmailError::Address(_))
        );
    }

    #[tokio::test]
    async fn unconfigured_send_reports_flag() {
        let delivery = EmailDelivery::new(None);
        let payload = NotificationPayload::Email(EmailReport::sample("a@example.com", Utc::now()));
        assert_matches!(delivery.send(&payload).await, Ok(SendOutcome::NotConfigured));
    }
}
