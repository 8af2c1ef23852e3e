//! Typed outbound notification payloads.
//!
//! Every message a transport can carry is a variant of
//! [`NotificationPayload`]; transports reject variants they cannot deliver.
//! Builders take the render time explicitly so output is deterministic.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use stockwatch_core::stock::{
    build_global_report, GlobalReport, LowStockItem, StockChangeEvent, StockSeverity,
};

/// Embed color for out-of-stock alerts (red).
pub const COLOR_CRITICAL: u32 = 0xFF0000;

/// Embed color for low-stock alerts (orange).
pub const COLOR_LOW: u32 = 0xFFA500;

/// Maximum items listed per severity bucket in a chat report.
pub const REPORT_LIST_LIMIT: usize = 10;

const BOT_USERNAME: &str = "Inventory Bot";
const FOOTER_TEXT: &str = "Inventory Management System";

/// Timeout for a single-product alert.
pub const ALERT_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for aggregate reports (chat or email).
pub const REPORT_TIMEOUT: Duration = Duration::from_secs(15);

/// Timeout for worker ingress forwarding.
pub const INGEST_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// NotificationPayload
// ---------------------------------------------------------------------------

/// A fully formed message, tagged by the kind of delivery it needs.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "body", rename_all = "snake_case")]
pub enum NotificationPayload {
    /// Single-product chat alert.
    ChatAlert(ChatMessage),
    /// Aggregate low-stock chat report.
    ChatReport(ChatMessage),
    /// Aggregate low-stock email report.
    Email(EmailReport),
    /// Stock event forwarded to the worker ingress.
    Ingest(IngestEvent),
}

impl NotificationPayload {
    /// Upper bound on a single delivery attempt for this payload.
    pub fn timeout(&self) -> Duration {
        match self {
            NotificationPayload::ChatAlert(_) => ALERT_TIMEOUT,
            NotificationPayload::ChatReport(_) | NotificationPayload::Email(_) => REPORT_TIMEOUT,
            NotificationPayload::Ingest(_) => INGEST_TIMEOUT,
        }
    }

    /// Short name used in logs and errors.
    pub fn kind(&self) -> &'static str {
        match self {
            NotificationPayload::ChatAlert(_) => "chat_alert",
            NotificationPayload::ChatReport(_) => "chat_report",
            NotificationPayload::Email(_) => "email",
            NotificationPayload::Ingest(_) => "ingest",
        }
    }
}

// ---------------------------------------------------------------------------
// Chat messages
// ---------------------------------------------------------------------------

/// Webhook body: one or more embeds plus bot identity overrides.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub embeds: Vec<Embed>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    /// RFC 3339 timestamp.
    pub timestamp: String,
    pub footer: EmbedFooter,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl EmbedField {
    fn new(name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            inline,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

impl ChatMessage {
    fn single(embed: Embed) -> Self {
        Self {
            embeds: vec![embed],
            username: Some(BOT_USERNAME.to_string()),
        }
    }

    /// The first embed; every message built here has exactly one.
    pub fn embed(&self) -> Option<&Embed> {
        self.embeds.first()
    }
}

/// Build the chat alert for one product.
///
/// Critical severity renders red, anything else as low (orange).
pub fn stock_alert_message(item: &LowStockItem, now: DateTime<Utc>) -> ChatMessage {
    let is_critical =
        StockSeverity::classify(item.stock, item.threshold) == Some(StockSeverity::Critical);

    let (title, description, color, status) = if is_critical {
        (
            "🚨 CRITICAL STOCK ALERT",
            format!("**{}** is completely out of stock!", item.name),
            COLOR_CRITICAL,
            "🔴 **OUT OF STOCK** - Immediate action required!".to_string(),
        )
    } else {
        (
            "⚠️ LOW STOCK ALERT",
            format!("**{}** is running low on stock.", item.name),
            COLOR_LOW,
            format!(
                "🟡 **LOW STOCK** - {} units below threshold",
                item.threshold - item.stock
            ),
        )
    };

    let embed = Embed {
        title: title.to_string(),
        description,
        color,
        fields: vec![
            EmbedField::new(
                "📦 Product Details",
                format!("**Name:** {}\n**SKU:** `{}`", item.name, item.sku),
                true,
            ),
            EmbedField::new(
                "📊 Stock Status",
                format!(
                    "**Current:** {} units\n**Threshold:** {} units",
                    item.stock, item.threshold
                ),
                true,
            ),
            EmbedField::new("📈 Status", status, false),
        ],
        timestamp: now.to_rfc3339(),
        footer: EmbedFooter {
            text: FOOTER_TEXT.to_string(),
        },
    };

    ChatMessage::single(embed)
}

/// Build the aggregate chat report.
pub fn global_report_message(report: &GlobalReport, now: DateTime<Utc>) -> ChatMessage {
    let mut fields = vec![EmbedField::new(
        "📈 Summary",
        format!(
            "**Total Items:** {}\n**Critical (Out of Stock):** {}\n**Low Stock:** {}",
            report.total_items,
            report.critical.len(),
            report.low_stock.len()
        ),
        false,
    )];

    if !report.critical.is_empty() {
        fields.push(EmbedField::new(
            format!("🚨 Critical Items ({})", report.critical.len()),
            bucket_listing(&report.critical),
            false,
        ));
    }

    if !report.low_stock.is_empty() {
        fields.push(EmbedField::new(
            format!("⚠️ Low Stock Items ({})", report.low_stock.len()),
            bucket_listing(&report.low_stock),
            false,
        ));
    }

    let actions = if report.has_critical() {
        "🔴 **URGENT:** Restock critical items immediately\n🟡 **PRIORITY:** Review low stock items\n📋 **PLAN:** Update inventory management strategy"
    } else {
        "🟡 **PRIORITY:** Review low stock items\n📋 **PLAN:** Consider restocking soon"
    };
    fields.push(EmbedField::new("🎯 Recommended Actions", actions, false));

    let embed = Embed {
        title: "📊 GLOBAL INVENTORY REPORT".to_string(),
        description: format!(
            "**{}** items require attention in your inventory.",
            report.total_items
        ),
        color: if report.has_critical() {
            COLOR_CRITICAL
        } else {
            COLOR_LOW
        },
        fields,
        timestamp: now.to_rfc3339(),
        footer: EmbedFooter {
            text: format!(
                "{FOOTER_TEXT} • Generated at {}",
                now.format("%Y-%m-%d %H:%M:%S UTC")
            ),
        },
    };

    ChatMessage::single(embed)
}

/// One line per item, capped at [`REPORT_LIST_LIMIT`] with an overflow note.
fn bucket_listing(items: &[LowStockItem]) -> String {
    let mut listing = items
        .iter()
        .take(REPORT_LIST_LIMIT)
        .map(|item| {
            format!(
                "• **{}** (`{}`) - **{}** units (threshold: {})",
                item.name, item.sku, item.stock, item.threshold
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    if items.len() > REPORT_LIST_LIMIT {
        listing.push_str(&format!(
            "\n... and {} more",
            items.len() - REPORT_LIST_LIMIT
        ));
    }
    listing
}

// ---------------------------------------------------------------------------
// Email report
// ---------------------------------------------------------------------------

/// Structured report model rendered into the email body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailReportData {
    pub items: Vec<LowStockItem>,
    pub total_items: usize,
    pub critical_items: usize,
    pub low_stock_items: usize,
    /// Locale-style date, e.g. `1/15/2025`.
    pub report_date: String,
}

impl EmailReportData {
    /// Summarise `items` as of `now`.
    pub fn new(items: Vec<LowStockItem>, now: DateTime<Utc>) -> Self {
        let report = build_global_report(&items);
        Self {
            total_items: items.len(),
            critical_items: report.critical.len(),
            low_stock_items: report.low_stock.len(),
            report_date: now.format("%-m/%-d/%Y").to_string(),
            items,
        }
    }
}

/// An email report addressed to validated recipients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailReport {
    pub recipients: Vec<String>,
    pub subject: String,
    pub data: EmailReportData,
}

impl EmailReport {
    /// Plain-text body.
    pub fn render_text(&self) -> String {
        let report = build_global_report(&self.data.items);
        let mut body = format!(
            "Inventory Report - {}\n\n\
             Summary\n\
             Total items: {}\n\
             Critical (out of stock): {}\n\
             Low stock: {}\n",
            self.data.report_date,
            self.data.total_items,
            self.data.critical_items,
            self.data.low_stock_items
        );

        if !report.critical.is_empty() {
            body.push_str("\nCritical items\n");
            for item in &report.critical {
                body.push_str(&format!(
                    "- {} ({}): 0 units (threshold: {})\n",
                    item.name, item.sku, item.threshold
                ));
            }
        }

        if !report.low_stock.is_empty() {
            body.push_str("\nLow stock items\n");
            for item in &report.low_stock {
                body.push_str(&format!(
                    "- {} ({}): {} units (threshold: {})\n",
                    item.name, item.sku, item.stock, item.threshold
                ));
            }
        }

        body.push_str(&format!("\n{FOOTER_TEXT}\n"));
        body
    }

    /// HTML alternative body.
    pub fn render_html(&self) -> String {
        let report = build_global_report(&self.data.items);
        let header_color = if self.data.critical_items > 0 {
            "#dc2626"
        } else {
            "#f59e0b"
        };

        let mut html = format!(
            "<html><body style=\"font-family: Arial, sans-serif; background-color: #f6f9fc;\">\
             <div style=\"max-width: 600px; margin: 0 auto; background-color: #ffffff;\">\
             <div style=\"background-color: {header_color}; padding: 30px 20px; text-align: center;\">\
             <h1 style=\"color: #ffffff; margin: 0;\">📊 Inventory Report</h1>\
             <p style=\"color: #ffffff;\">{}</p></div>\
             <div style=\"padding: 30px 20px;\"><h2>Summary</h2>\
             <p>Total items: <strong>{}</strong><br>\
             Critical (out of stock): <strong>{}</strong><br>\
             Low stock: <strong>{}</strong></p>",
            escape_html(&self.data.report_date),
            self.data.total_items,
            self.data.critical_items,
            self.data.low_stock_items
        );

        for (heading, items) in [
            ("🚨 Critical Items", &report.critical),
            ("⚠️ Low Stock Items", &report.low_stock),
        ] {
            if items.is_empty() {
                continue;
            }
            html.push_str(&format!("<h3>{heading}</h3><table width=\"100%\">"));
            html.push_str("<tr><th align=\"left\">Product</th><th align=\"left\">SKU</th><th>Stock</th><th>Threshold</th></tr>");
            for item in items.iter() {
                html.push_str(&format!(
                    "<tr><td>{}</td><td><code>{}</code></td><td align=\"center\">{}</td><td align=\"center\">{}</td></tr>",
                    escape_html(&item.name),
                    escape_html(&item.sku),
                    item.stock,
                    item.threshold
                ));
            }
            html.push_str("</table>");
        }

        html.push_str(&format!(
            "</div><p style=\"color: #6b7280; text-align: center;\">{FOOTER_TEXT}</p></div></body></html>"
        ));
        html
    }

    /// Canned report used by the test-email endpoint.
    pub fn sample(recipient: impl Into<String>, now: DateTime<Utc>) -> Self {
        let items = vec![LowStockItem {
            id: 1,
            name: "Test Product".to_string(),
            sku: "TEST-001".to_string(),
            stock: 0,
            threshold: 10,
        }];
        Self {
            recipients: vec![recipient.into()],
            subject: "Test Email - Inventory System".to_string(),
            data: EmailReportData::new(items, now),
        }
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Worker ingress event
// ---------------------------------------------------------------------------

/// Event type expected by the worker ingress endpoint.
pub const INGEST_EVENT_TYPE: &str = "product.stock.updated";

/// Body posted to the worker ingress.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub occurred_at: String,
    pub data: IngestData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestData {
    pub product_id: i64,
    pub stock: i32,
    pub threshold: i32,
    pub name: String,
    pub sku: String,
}

impl IngestEvent {
    pub fn from_stock_change(event: &StockChangeEvent, now: DateTime<Utc>) -> Self {
        Self {
            event_type: INGEST_EVENT_TYPE.to_string(),
            occurred_at: now.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            data: IngestData {
                product_id: event.product_id,
                stock: event.stock,
                threshold: event.threshold,
                name: event.name.clone(),
                sku: event.sku.clone(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
