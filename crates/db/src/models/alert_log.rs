//! Alert log entity model and insert DTO.

use serde::Serialize;
use sqlx::FromRow;
use stockwatch_core::types::{DbId, Timestamp};

/// A row from the `alert_logs` table. Rows are append-only.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AlertLog {
    pub id: DbId,
    /// `0` for aggregate reports.
    pub product_id: DbId,
    pub stock_before: Option<i32>,
    pub stock_after: i32,
    pub threshold: i32,
    pub channel: String,
    pub dedupe_key: String,
    pub created_at: Timestamp,
}

/// DTO for recording a delivered alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAlertLog {
    pub product_id: DbId,
    pub stock_before: Option<i32>,
    pub stock_after: i32,
    pub threshold: i32,
    pub channel: String,
    pub dedupe_key: String,
}
