use std::time::Duration;

use stockwatch_core::dedup::DEFAULT_DEDUPE_WINDOW;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Upper bound on draining background tasks after shutdown (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Shared token required in `x-admin-token` on `/api/v1`. Unset disables
    /// the check.
    pub admin_token: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                 |
    /// |-------------------------|-------------------------|
    /// | `HOST`                  | `0.0.0.0`               |
    /// | `PORT`                  | `3000`                  |
    /// | `CORS_ORIGINS`          | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                    |
    /// | `ADMIN_TOKEN`           | unset                   |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let admin_token = non_empty_var("ADMIN_TOKEN");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            admin_token,
        }
    }
}

/// Notification channel configuration.
///
/// SMTP settings are loaded separately by
/// [`EmailConfig::from_env`](stockwatch_events::EmailConfig::from_env).
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    /// Chat webhook endpoint. Unset leaves the chat channel unconfigured.
    pub discord_webhook_url: Option<String>,
    /// Worker ingress endpoint for forwarded stock events.
    pub worker_ingress_url: Option<String>,
    /// Value sent in the `x-shared-secret` header to the worker.
    pub worker_shared_secret: String,
    /// Window of the in-memory dedupe cache.
    pub dedupe_window: Duration,
}

impl NotifyConfig {
    /// | Env Var                | Default |
    /// |------------------------|---------|
    /// | `DISCORD_WEBHOOK_URL`  | unset   |
    /// | `WORKER_INGRESS_URL`   | unset   |
    /// | `WORKER_SHARED_SECRET` | empty   |
    /// | `DEDUPE_WINDOW_MS`     | `5000`  |
    pub fn from_env() -> Self {
        let dedupe_window = std::env::var("DEDUPE_WINDOW_MS")
            .ok()
            .map(|v| {
                v.parse::<u64>()
                    .expect("DEDUPE_WINDOW_MS must be a valid u64")
            })
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_DEDUPE_WINDOW);

        Self {
            discord_webhook_url: non_empty_var("DISCORD_WEBHOOK_URL"),
            worker_ingress_url: non_empty_var("WORKER_INGRESS_URL"),
            worker_shared_secret: std::env::var("WORKER_SHARED_SECRET").unwrap_or_default(),
            dedupe_window,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
