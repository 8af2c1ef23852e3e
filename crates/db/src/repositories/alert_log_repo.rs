//! Repository for the `alert_logs` table.

use sqlx::PgPool;

use crate::models::alert_log::{AlertLog, CreateAlertLog};

/// Column list for `alert_logs` queries.
const COLUMNS: &str =
    "id, product_id, stock_before, stock_after, threshold, channel, dedupe_key, created_at";

/// Name of the unique constraint on `(channel, dedupe_key)`.
pub const UQ_CHANNEL_DEDUPE_KEY: &str = "uq_alert_logs_channel_dedupe_key";

/// Provides append and lookup operations for delivered alerts.
pub struct AlertLogRepo;

impl AlertLogRepo {
    /// Whether an alert with this `(channel, dedupe_key)` was already recorded.
    pub async fn exists(
        pool: &PgPool,
        channel: &str,
        dedupe_key: &str,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM alert_logs WHERE channel = $1 AND dedupe_key = $2)",
        )
        .bind(channel)
        .bind(dedupe_key)
        .fetch_one(pool)
        .await
    }

    /// Find the recorded alert for `(channel, dedupe_key)`, if any.
    pub async fn find_by_key(
        pool: &PgPool,
        channel: &str,
        dedupe_key: &str,
    ) -> Result<Option<AlertLog>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM alert_logs WHERE channel = $1 AND dedupe_key = $2");
        sqlx::query_as::<_, AlertLog>(&query)
            .bind(channel)
            .bind(dedupe_key)
            .fetch_optional(pool)
            .await
    }

    /// Append a delivered alert, returning the created row.
    ///
    /// A second insert for the same `(channel, dedupe_key)` fails with a
    /// unique violation on [`UQ_CHANNEL_DEDUPE_KEY`].
    pub async fn insert(pool: &PgPool, input: &CreateAlertLog) -> Result<AlertLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO alert_logs
                (product_id, stock_before, stock_after, threshold, channel, dedupe_key)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AlertLog>(&query)
            .bind(input.product_id)
            .bind(input.stock_before)
            .bind(input.stock_after)
            .bind(input.threshold)
            .bind(&input.channel)
            .bind(&input.dedupe_key)
            .fetch_one(pool)
            .await
    }

    /// List recent alerts ordered newest-first.
    pub async fn list_recent(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AlertLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM alert_logs ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, AlertLog>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}
