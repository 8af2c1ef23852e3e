//! Durable alert log seam used by explicit dispatch.
//!
//! [`AlertLogStore`] abstracts the `alert_logs` table so the dispatcher can
//! be exercised without a database. [`PgAlertLogStore`] is the production
//! implementation; uniqueness of `(channel, dedupe_key)` is enforced by the
//! `uq_alert_logs_channel_dedupe_key` constraint.

use async_trait::async_trait;
use stockwatch_core::channels::AlertChannel;
use stockwatch_core::types::DbId;
use stockwatch_db::models::alert_log::CreateAlertLog;
use stockwatch_db::repositories::alert_log_repo::UQ_CHANNEL_DEDUPE_KEY;
use stockwatch_db::repositories::AlertLogRepo;
use stockwatch_db::DbPool;

/// Result of appending an alert log row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// A new row was written.
    Recorded { id: DbId },
    /// Another writer recorded the same `(channel, dedupe_key)` first.
    AlreadyRecorded,
}

/// Durable record of delivered alerts.
#[async_trait]
pub trait AlertLogStore: Send + Sync {
    /// Whether `(channel, dedupe_key)` has already been recorded.
    async fn exists(&self, channel: AlertChannel, dedupe_key: &str) -> Result<bool, sqlx::Error>;

    /// Append a row. A uniqueness race surfaces as
    /// [`RecordOutcome::AlreadyRecorded`], never as a duplicate row.
    async fn record(&self, entry: &CreateAlertLog) -> Result<RecordOutcome, sqlx::Error>;
}

/// [`AlertLogStore`] backed by the `alert_logs` table.
#[derive(Clone)]
pub struct PgAlertLogStore {
    pool: DbPool,
}

impl PgAlertLogStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AlertLogStore for PgAlertLogStore {
    async fn exists(&self, channel: AlertChannel, dedupe_key: &str) -> Result<bool, sqlx::Error> {
        AlertLogRepo::exists(&self.pool, channel.as_str(), dedupe_key).await
    }

    async fn record(&self, entry: &CreateAlertLog) -> Result<RecordOutcome, sqlx::Error> {
        match AlertLogRepo::insert(&self.pool, entry).await {
            Ok(row) => Ok(RecordOutcome::Recorded { id: row.id }),
            Err(e) if stockwatch_db::is_unique_violation(&e, UQ_CHANNEL_DEDUPE_KEY) => {
                Ok(RecordOutcome::AlreadyRecorded)
            }
            Err(e) => Err(e),
        }
    }
}
