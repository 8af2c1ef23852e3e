//! Handlers for `/notifications`: explicit alerts, reports, channel status
//! and test sends.
//!
//! Explicit sends go through [`NotificationDispatcher::dispatch_explicit`],
//! which consults and appends to the alert log. Test sends call the channel
//! transport directly and leave no trace in the log.
//!
//! [`NotificationDispatcher::dispatch_explicit`]: stockwatch_events::NotificationDispatcher::dispatch_explicit

use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use stockwatch_core::channels::AlertChannel;
use stockwatch_core::recipients::parse_recipients;
use stockwatch_core::stock::{build_global_report, LowStockItem};
use stockwatch_core::types::DbId;
use stockwatch_db::models::alert_log::AlertLog;
use stockwatch_db::models::product::LowStockRow;
use stockwatch_db::repositories::{AlertLogRepo, ProductRepo};
use stockwatch_events::payload::{stock_alert_message, EmailReport, NotificationPayload};
use stockwatch_events::{
    DispatchError, ExplicitAlert, ExplicitOutcome, ExplicitRequest, ReportSummary, SendOutcome,
};

use crate::error::AppResult;
use crate::middleware::admin::RequireAdmin;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// Body of `POST /notifications/discord`.
#[derive(Debug, Deserialize)]
pub struct ProductAlertRequest {
    pub product_id: DbId,
    pub name: String,
    pub sku: String,
    pub stock: i32,
    pub threshold: i32,
    pub dedupe_key: String,
}

/// Body of `POST /notifications/global-report`.
#[derive(Debug, Deserialize)]
pub struct ChatReportRequest {
    #[serde(default)]
    pub items: Vec<LowStockItem>,
    pub dedupe_key: String,
}

/// A single delimited string or a list of addresses.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RecipientsInput {
    One(String),
    Many(Vec<String>),
}

impl RecipientsInput {
    fn into_vec(self) -> Vec<String> {
        match self {
            RecipientsInput::One(raw) => vec![raw],
            RecipientsInput::Many(list) => list,
        }
    }
}

/// Body of `POST /notifications/email`.
#[derive(Debug, Deserialize)]
pub struct EmailReportRequest {
    pub email: RecipientsInput,
    pub subject: String,
    /// Defaults to the current low-stock rows when absent or empty.
    #[serde(default)]
    pub items: Option<Vec<LowStockItem>>,
    /// Defaults to `email-{millis}`.
    #[serde(default)]
    pub dedupe_key: Option<String>,
}

/// Body of `POST /notifications/email/test`.
#[derive(Debug, Deserialize)]
pub struct TestEmailRequest {
    pub email: String,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Result of an explicit or test send.
#[derive(Debug, Serialize)]
pub struct DispatchResponse {
    pub sent: bool,
    pub configured: bool,
    pub channel: AlertChannel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dedupe_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recorded: Option<bool>,
    #[serde(flatten)]
    pub summary: Option<ReportSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recipients: Vec<String>,
}

impl DispatchResponse {
    fn test_send(channel: AlertChannel, outcome: SendOutcome, recipients: Vec<String>) -> Self {
        let sent = outcome == SendOutcome::Delivered;
        Self {
            sent,
            configured: sent,
            channel,
            dedupe_key: None,
            recorded: None,
            summary: None,
            recipients,
        }
    }
}

impl From<ExplicitOutcome> for DispatchResponse {
    fn from(outcome: ExplicitOutcome) -> Self {
        match outcome {
            ExplicitOutcome::Sent(receipt) => Self {
                sent: true,
                configured: true,
                channel: receipt.channel,
                dedupe_key: Some(receipt.dedupe_key),
                recorded: Some(receipt.recorded),
                summary: receipt.summary,
                recipients: receipt.recipients,
            },
            ExplicitOutcome::NotConfigured { channel } => Self {
                sent: false,
                configured: false,
                channel,
                dedupe_key: None,
                recorded: None,
                summary: None,
                recipients: Vec::new(),
            },
        }
    }
}

/// Chat channel configuration status.
#[derive(Debug, Serialize)]
pub struct ChannelStatus {
    pub channel: AlertChannel,
    pub configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

/// Current low-stock rows with bucket counts.
#[derive(Debug, Serialize)]
pub struct LowStockPreview {
    pub low_stock_items: Vec<LowStockRow>,
    pub total_items: usize,
    pub critical_items: usize,
    pub low_stock_only: usize,
    pub configured: bool,
}

// ---------------------------------------------------------------------------
// Chat channel
// ---------------------------------------------------------------------------

/// POST /api/v1/notifications/discord
pub async fn send_product_alert(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<ProductAlertRequest>,
) -> AppResult<Json<DataResponse<DispatchResponse>>> {
    let outcome = state
        .dispatcher
        .dispatch_explicit(ExplicitRequest {
            dedupe_key: input.dedupe_key,
            alert: ExplicitAlert::Product {
                product_id: input.product_id,
                name: input.name,
                sku: input.sku,
                stock: input.stock,
                threshold: input.threshold,
            },
        })
        .await?;

    Ok(Json(DataResponse {
        data: outcome.into(),
    }))
}

/// GET /api/v1/notifications/discord
pub async fn chat_status(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Json<DataResponse<ChannelStatus>> {
    let configured = state
        .dispatcher
        .transport(AlertChannel::Discord)
        .is_configured();

    Json(DataResponse {
        data: ChannelStatus {
            channel: AlertChannel::Discord,
            configured,
            webhook_url: state.webhook_preview.clone().filter(|_| configured),
        },
    })
}

/// POST /api/v1/notifications/discord/test
pub async fn send_test_chat(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<DispatchResponse>>> {
    let item = LowStockItem {
        id: 1,
        name: "Test Product".to_string(),
        sku: "TEST-001".to_string(),
        stock: 0,
        threshold: 10,
    };
    let payload = NotificationPayload::ChatAlert(stock_alert_message(&item, Utc::now()));

    let outcome = state
        .dispatcher
        .transport(AlertChannel::Discord)
        .send(&payload)
        .await
        .map_err(|source| DispatchError::DeliveryFailed {
            channel: AlertChannel::Discord,
            source,
        })?;

    Ok(Json(DataResponse {
        data: DispatchResponse::test_send(AlertChannel::Discord, outcome, Vec::new()),
    }))
}

/// POST /api/v1/notifications/global-report
pub async fn send_chat_report(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<ChatReportRequest>,
) -> AppResult<Json<DataResponse<DispatchResponse>>> {
    let outcome = state
        .dispatcher
        .dispatch_explicit(ExplicitRequest {
            dedupe_key: input.dedupe_key,
            alert: ExplicitAlert::ChatReport { items: input.items },
        })
        .await?;

    Ok(Json(DataResponse {
        data: outcome.into(),
    }))
}

// ---------------------------------------------------------------------------
// Email channel
// ---------------------------------------------------------------------------

/// POST /api/v1/notifications/email
pub async fn send_email_report(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<EmailReportRequest>,
) -> AppResult<Json<DataResponse<DispatchResponse>>> {
    let items = match input.items.filter(|items| !items.is_empty()) {
        Some(items) => items,
        None => ProductRepo::list_low_stock(&state.pool)
            .await?
            .into_iter()
            .map(LowStockItem::from)
            .collect(),
    };

    let dedupe_key = input
        .dedupe_key
        .filter(|k| !k.trim().is_empty())
        .unwrap_or_else(|| format!("email-{}", Utc::now().timestamp_millis()));

    let outcome = state
        .dispatcher
        .dispatch_explicit(ExplicitRequest {
            dedupe_key,
            alert: ExplicitAlert::EmailReport {
                recipients: input.email.into_vec(),
                subject: input.subject,
                items,
            },
        })
        .await?;

    Ok(Json(DataResponse {
        data: outcome.into(),
    }))
}

/// POST /api/v1/notifications/email/test
pub async fn send_test_email(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<TestEmailRequest>,
) -> AppResult<Json<DataResponse<DispatchResponse>>> {
    let recipients = parse_recipients(&[input.email])?;
    let mut report = EmailReport::sample(recipients[0].clone(), Utc::now());
    report.recipients = recipients.clone();

    let outcome = state
        .dispatcher
        .transport(AlertChannel::Email)
        .send(&NotificationPayload::Email(report))
        .await
        .map_err(|source| DispatchError::DeliveryFailed {
            channel: AlertChannel::Email,
            source,
        })?;

    tracing::info!(recipients = recipients.len(), ?outcome, "Test email processed");
    Ok(Json(DataResponse {
        data: DispatchResponse::test_send(AlertChannel::Email, outcome, recipients),
    }))
}

// ---------------------------------------------------------------------------
// Previews and history
// ---------------------------------------------------------------------------

/// GET /api/v1/notifications/global-report
pub async fn chat_report_preview(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<LowStockPreview>>> {
    low_stock_preview(&state, AlertChannel::Discord).await
}

/// GET /api/v1/notifications/email
pub async fn email_report_preview(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<LowStockPreview>>> {
    low_stock_preview(&state, AlertChannel::Email).await
}

async fn low_stock_preview(
    state: &AppState,
    channel: AlertChannel,
) -> AppResult<Json<DataResponse<LowStockPreview>>> {
    let rows = ProductRepo::list_low_stock(&state.pool).await?;
    let items: Vec<LowStockItem> = rows.iter().cloned().map(LowStockItem::from).collect();
    let report = build_global_report(&items);

    Ok(Json(DataResponse {
        data: LowStockPreview {
            total_items: report.total_items,
            critical_items: report.critical.len(),
            low_stock_only: report.low_stock.len(),
            low_stock_items: rows,
            configured: state.dispatcher.transport(channel).is_configured(),
        },
    }))
}

/// GET /api/v1/notifications/alerts
pub async fn list_alerts(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<AlertLog>>>> {
    let alerts = AlertLogRepo::list_recent(&state.pool, params.limit(), params.offset()).await?;
    Ok(Json(DataResponse { data: alerts }))
}
