//! Route definitions for the `/notifications` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::notifications;
use crate::state::AppState;

/// Routes mounted at `/notifications`.
///
/// ```text
/// GET    /discord             -> chat_status
/// POST   /discord             -> send_product_alert
/// POST   /discord/test        -> send_test_chat
/// GET    /global-report       -> chat_report_preview
/// POST   /global-report       -> send_chat_report
/// GET    /email               -> email_report_preview
/// POST   /email               -> send_email_report
/// POST   /email/test          -> send_test_email
/// GET    /alerts              -> list_alerts
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/discord",
            get(notifications::chat_status).post(notifications::send_product_alert),
        )
        .route("/discord/test", post(notifications::send_test_chat))
        .route(
            "/global-report",
            get(notifications::chat_report_preview).post(notifications::send_chat_report),
        )
        .route(
            "/email",
            get(notifications::email_report_preview).post(notifications::send_email_report),
        )
        .route("/email/test", post(notifications::send_test_email))
        .route("/alerts", get(notifications::list_alerts))
}
