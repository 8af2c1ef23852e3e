use std::sync::Arc;

use stockwatch_events::{EventBus, NotificationDispatcher};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: inner data is behind `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: stockwatch_db::DbPool,
    /// Server configuration (admin token, timeouts).
    pub config: Arc<ServerConfig>,
    /// Post-commit stock change events.
    pub event_bus: Arc<EventBus>,
    /// Automatic and explicit notification dispatch.
    pub dispatcher: Arc<NotificationDispatcher>,
    /// Masked chat webhook URL shown by the status endpoint.
    pub webhook_preview: Option<String>,
}
