//! Low-stock notification dispatch.
//!
//! [`NotificationDispatcher`] owns the two dispatch paths:
//!
//! - **Automatic** ([`NotificationDispatcher::dispatch_automatic`]): runs
//!   after a stock mutation commits. Checks the threshold, consults the
//!   in-memory [`DedupCache`], sends the chat alert, and forwards the event to
//!   the worker ingress. Never fails; every problem is logged and reported as
//!   an [`AutomaticOutcome`].
//! - **Explicit** ([`NotificationDispatcher::dispatch_explicit`]):
//!   user-initiated alerts and reports keyed by a caller-stable dedupe key.
//!   Consults the durable [`AlertLogStore`] before sending and records the
//!   delivery afterwards.
//!
//! Delivery and logging are not transactional: a crash between them can
//! produce a delivered-but-unrecorded alert, so a retry may send twice.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use stockwatch_core::channels::AlertChannel;
use stockwatch_core::dedup::{automatic_dedupe_key, Clock, DedupCache, SystemClock};
use stockwatch_core::error::CoreError;
use stockwatch_core::recipients::parse_recipients;
use stockwatch_core::stock::{build_global_report, LowStockItem, StockChangeEvent};
use stockwatch_core::types::{DbId, GLOBAL_REPORT_PRODUCT_ID};
use stockwatch_db::models::alert_log::CreateAlertLog;

use crate::alert_log::{AlertLogStore, RecordOutcome};
use crate::delivery::{ChannelTransport, SendOutcome, TransportError};
use crate::payload::{
    global_report_message, stock_alert_message, EmailReport, EmailReportData, IngestEvent,
    NotificationPayload,
};

// ---------------------------------------------------------------------------
// Errors and outcomes
// ---------------------------------------------------------------------------

/// Failure of an explicit dispatch. None of these leave process state
/// inconsistent; the caller may retry.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// `(channel, dedupe_key)` is already in the alert log.
    #[error("Alert already sent on {channel} for dedupe key '{dedupe_key}'")]
    DuplicateAlert {
        channel: AlertChannel,
        dedupe_key: String,
    },

    /// The transport rejected the payload or timed out. Nothing was logged.
    #[error("Failed to deliver {channel} notification: {source}")]
    DeliveryFailed {
        channel: AlertChannel,
        #[source]
        source: TransportError,
    },

    /// The request was malformed.
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// The alert log could not be queried before sending.
    #[error("Alert log lookup failed: {0}")]
    Store(#[from] sqlx::Error),
}

impl From<CoreError> for DispatchError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => DispatchError::ValidationFailed(msg),
            other => DispatchError::ValidationFailed(other.to_string()),
        }
    }
}

/// What happened to an automatic dispatch. Informational only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutomaticOutcome {
    /// Stock is not below threshold; nothing was touched.
    Skipped,
    /// The dedupe key was seen within the cache window.
    Suppressed { dedupe_key: String },
    /// The chat alert was delivered.
    Sent { dedupe_key: String },
    /// No chat endpoint is configured.
    NotConfigured { dedupe_key: String },
    /// The chat transport failed; the error was logged.
    Failed { dedupe_key: String },
}

/// Counts reported back for aggregate alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub items_reported: usize,
    pub critical_items: usize,
    pub low_stock_items: usize,
}

/// Details of a delivered explicit alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertReceipt {
    pub channel: AlertChannel,
    pub dedupe_key: String,
    /// `false` when delivery succeeded but the alert log write did not.
    pub recorded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<ReportSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recipients: Vec<String>,
}

/// Successful result of an explicit dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExplicitOutcome {
    Sent(AlertReceipt),
    /// The channel has no endpoint/credentials; nothing was sent or logged.
    NotConfigured { channel: AlertChannel },
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// A user-initiated alert with its caller-stable dedupe key.
#[derive(Debug, Clone)]
pub struct ExplicitRequest {
    pub dedupe_key: String,
    pub alert: ExplicitAlert,
}

/// The alert kinds a user can trigger. The channel follows from the variant.
#[derive(Debug, Clone)]
pub enum ExplicitAlert {
    /// "Notify now" for one product, sent to the chat webhook.
    Product {
        product_id: DbId,
        name: String,
        sku: String,
        stock: i32,
        threshold: i32,
    },
    /// Aggregate low-stock report sent to the chat webhook.
    ChatReport { items: Vec<LowStockItem> },
    /// Aggregate low-stock report emailed to `recipients`.
    ///
    /// Each recipient entry may be a `,`/`;` delimited list.
    EmailReport {
        recipients: Vec<String>,
        subject: String,
        items: Vec<LowStockItem>,
    },
}

impl ExplicitAlert {
    pub fn channel(&self) -> AlertChannel {
        match self {
            ExplicitAlert::Product { .. } | ExplicitAlert::ChatReport { .. } => {
                AlertChannel::Discord
            }
            ExplicitAlert::EmailReport { .. } => AlertChannel::Email,
        }
    }
}

/// Validated, ready-to-send form of an [`ExplicitRequest`].
struct PreparedAlert {
    payload: NotificationPayload,
    log_entry: CreateAlertLog,
    summary: Option<ReportSummary>,
    recipients: Vec<String>,
}

// ---------------------------------------------------------------------------
// NotificationDispatcher
// ---------------------------------------------------------------------------

/// Decides when and where low-stock notifications go.
pub struct NotificationDispatcher {
    chat: Arc<dyn ChannelTransport>,
    email: Arc<dyn ChannelTransport>,
    ingress: Option<Arc<dyn ChannelTransport>>,
    alert_log: Arc<dyn AlertLogStore>,
    cache: DedupCache,
    clock: Arc<dyn Clock>,
}

impl NotificationDispatcher {
    /// Create a dispatcher with the default dedupe window and system clock.
    pub fn new(
        chat: Arc<dyn ChannelTransport>,
        email: Arc<dyn ChannelTransport>,
        alert_log: Arc<dyn AlertLogStore>,
    ) -> Self {
        Self {
            chat,
            email,
            ingress: None,
            alert_log,
            cache: DedupCache::default(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Also forward automatic events to the worker ingress.
    pub fn with_ingress(mut self, ingress: Arc<dyn ChannelTransport>) -> Self {
        self.ingress = Some(ingress);
        self
    }

    /// Replace the dedupe cache (e.g. to change the window).
    pub fn with_cache(mut self, cache: DedupCache) -> Self {
        self.cache = cache;
        self
    }

    /// Replace the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The transport serving `channel`.
    pub fn transport(&self, channel: AlertChannel) -> &Arc<dyn ChannelTransport> {
        match channel {
            AlertChannel::Discord => &self.chat,
            AlertChannel::Email => &self.email,
        }
    }

    /// Whether the worker ingress forwarder is configured.
    pub fn ingress_configured(&self) -> bool {
        self.ingress.as_ref().is_some_and(|i| i.is_configured())
    }

    fn now(&self) -> (i64, DateTime<Utc>) {
        let millis = self.clock.now_millis();
        let at = DateTime::from_timestamp_millis(millis).unwrap_or_else(Utc::now);
        (millis, at)
    }

    // -- Automatic path -----------------------------------------------------

    /// Handle a committed stock change. Never returns an error.
    pub async fn dispatch_automatic(&self, event: &StockChangeEvent) -> AutomaticOutcome {
        if !event.below_threshold {
            return AutomaticOutcome::Skipped;
        }

        let (now_millis, now) = self.now();
        let dedupe_key = automatic_dedupe_key(event.product_id, event.stock, now_millis);

        if !self.cache.check_and_insert(&dedupe_key, now_millis) {
            tracing::debug!(dedupe_key = %dedupe_key, "Duplicate stock alert suppressed");
            return AutomaticOutcome::Suppressed { dedupe_key };
        }

        let alert = NotificationPayload::ChatAlert(stock_alert_message(&event.as_item(), now));
        let outcome = match self.chat.send(&alert).await {
            Ok(SendOutcome::Delivered) => AutomaticOutcome::Sent {
                dedupe_key: dedupe_key.clone(),
            },
            Ok(SendOutcome::NotConfigured) => AutomaticOutcome::NotConfigured {
                dedupe_key: dedupe_key.clone(),
            },
            Err(e) => {
                tracing::error!(
                    error = %e,
                    product_id = event.product_id,
                    dedupe_key = %dedupe_key,
                    "Failed to send stock alert"
                );
                AutomaticOutcome::Failed {
                    dedupe_key: dedupe_key.clone(),
                }
            }
        };

        if let Some(ingress) = &self.ingress {
            let forward = NotificationPayload::Ingest(IngestEvent::from_stock_change(event, now));
            if let Err(e) = ingress.send(&forward).await {
                tracing::error!(
                    error = %e,
                    product_id = event.product_id,
                    "Failed to forward stock event to worker"
                );
            }
        }

        outcome
    }

    // -- Explicit path ------------------------------------------------------

    /// Send a user-initiated alert at most once per `(channel, dedupe_key)`.
    pub async fn dispatch_explicit(
        &self,
        request: ExplicitRequest,
    ) -> Result<ExplicitOutcome, DispatchError> {
        let channel = request.alert.channel();
        let dedupe_key = request.dedupe_key.trim().to_string();
        if dedupe_key.is_empty() {
            return Err(DispatchError::ValidationFailed(
                "dedupe_key is required".to_string(),
            ));
        }

        let prepared = self.prepare(request.alert, channel, &dedupe_key)?;

        if self.alert_log.exists(channel, &dedupe_key).await? {
            tracing::info!(%channel, dedupe_key = %dedupe_key, "Alert already sent, skipping");
            return Err(DispatchError::DuplicateAlert {
                channel,
                dedupe_key,
            });
        }

        match self.transport(channel).send(&prepared.payload).await {
            Ok(SendOutcome::Delivered) => {}
            Ok(SendOutcome::NotConfigured) => {
                return Ok(ExplicitOutcome::NotConfigured { channel });
            }
            Err(source) => {
                tracing::warn!(%channel, dedupe_key = %dedupe_key, error = %source, "Explicit alert delivery failed");
                return Err(DispatchError::DeliveryFailed { channel, source });
            }
        }

        let recorded = match self.alert_log.record(&prepared.log_entry).await {
            Ok(RecordOutcome::Recorded { id }) => {
                tracing::info!(%channel, dedupe_key = %dedupe_key, alert_log_id = id, "Alert delivered and recorded");
                true
            }
            Ok(RecordOutcome::AlreadyRecorded) => {
                tracing::warn!(%channel, dedupe_key = %dedupe_key, "Alert delivered but a concurrent sender recorded it first");
                false
            }
            Err(e) => {
                tracing::error!(%channel, dedupe_key = %dedupe_key, error = %e, "Alert delivered but not recorded");
                false
            }
        };

        Ok(ExplicitOutcome::Sent(AlertReceipt {
            channel,
            dedupe_key,
            recorded,
            summary: prepared.summary,
            recipients: prepared.recipients,
        }))
    }

    /// Validate the request and build its payload and log row.
    fn prepare(
        &self,
        alert: ExplicitAlert,
        channel: AlertChannel,
        dedupe_key: &str,
    ) -> Result<PreparedAlert, DispatchError> {
        let (_, now) = self.now();

        match alert {
            ExplicitAlert::Product {
                product_id,
                name,
                sku,
                stock,
                threshold,
            } => {
                if product_id <= 0 || name.trim().is_empty() || sku.trim().is_empty() {
                    return Err(DispatchError::ValidationFailed(
                        "product_id, name and sku are required".to_string(),
                    ));
                }
                if stock < 0 || threshold <= 0 {
                    return Err(DispatchError::ValidationFailed(
                        "stock must be >= 0 and threshold must be > 0".to_string(),
                    ));
                }

                let item = LowStockItem {
                    id: product_id,
                    name,
                    sku,
                    stock,
                    threshold,
                };
                Ok(PreparedAlert {
                    payload: NotificationPayload::ChatAlert(stock_alert_message(&item, now)),
                    log_entry: CreateAlertLog {
                        product_id,
                        stock_before: Some(stock),
                        stock_after: stock,
                        threshold,
                        channel: channel.as_str().to_string(),
                        dedupe_key: dedupe_key.to_string(),
                    },
                    summary: None,
                    recipients: Vec::new(),
                })
            }
            ExplicitAlert::ChatReport { items } => {
                let summary = summarize(&items)?;
                let report = build_global_report(&items);
                Ok(PreparedAlert {
                    payload: NotificationPayload::ChatReport(global_report_message(&report, now)),
                    log_entry: report_log_entry(channel, dedupe_key, items.len()),
                    summary: Some(summary),
                    recipients: Vec::new(),
                })
            }
            ExplicitAlert::EmailReport {
                recipients,
                subject,
                items,
            } => {
                let recipients = parse_recipients(&recipients)?;
                if subject.trim().is_empty() {
                    return Err(DispatchError::ValidationFailed(
                        "subject is required".to_string(),
                    ));
                }
                let summary = summarize(&items)?;
                let log_entry = report_log_entry(channel, dedupe_key, items.len());
                Ok(PreparedAlert {
                    payload: NotificationPayload::Email(EmailReport {
                        recipients: recipients.clone(),
                        subject,
                        data: EmailReportData::new(items, now),
                    }),
                    log_entry,
                    summary: Some(summary),
                    recipients,
                })
            }
        }
    }
}

/// Report counts; rejects empty reports.
fn summarize(items: &[LowStockItem]) -> Result<ReportSummary, DispatchError> {
    if items.is_empty() {
        return Err(DispatchError::ValidationFailed(
            "No low stock items to report".to_string(),
        ));
    }
    let report = build_global_report(items);
    Ok(ReportSummary {
        items_reported: items.len(),
        critical_items: report.critical.len(),
        low_stock_items: report.low_stock.len(),
    })
}

/// Aggregate reports store the item count in every numeric column.
fn report_log_entry(channel: AlertChannel, dedupe_key: &str, item_count: usize) -> CreateAlertLog {
    let count = i32::try_from(item_count).unwrap_or(i32::MAX);
    CreateAlertLog {
        product_id: GLOBAL_REPORT_PRODUCT_ID,
        stock_before: Some(count),
        stock_after: count,
        threshold: count,
        channel: channel.as_str().to_string(),
        dedupe_key: dedupe_key.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
