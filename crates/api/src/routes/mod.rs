pub mod health;
pub mod notifications;
pub mod products;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Every route requires `x-admin-token` when `ADMIN_TOKEN` is configured.
///
/// ```text
/// /products                          list (?q=, ?below=threshold), create
/// /products/{id}                     get, update, delete
///
/// /notifications/discord             status (GET), product alert (POST)
/// /notifications/discord/test        test alert (POST)
/// /notifications/global-report       preview (GET), chat report (POST)
/// /notifications/email               preview (GET), email report (POST)
/// /notifications/email/test          test email (POST)
/// /notifications/alerts              delivered alert history (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/products", products::router())
        .nest("/notifications", notifications::router())
}
