#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use stockwatch_api::config::ServerConfig;
use stockwatch_api::middleware::admin::ADMIN_TOKEN_HEADER;
use stockwatch_api::notifications::StockAlertRouter;
use stockwatch_api::routes;
use stockwatch_api::state::AppState;
use stockwatch_events::delivery::webhook::WebhookError;
use stockwatch_events::payload::NotificationPayload;
use stockwatch_events::{
    ChannelTransport, EventBus, NotificationDispatcher, PgAlertLogStore, SendOutcome,
    TransportError,
};

pub const TEST_WEBHOOK_PREVIEW: &str = "https://discord.test/...";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config(admin_token: Option<&str>) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        admin_token: admin_token.map(str::to_string),
    }
}

// ---------------------------------------------------------------------------
// Recording transport
// ---------------------------------------------------------------------------

/// How a [`RecordingTransport`] answers sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    Deliver,
    Fail,
    Unconfigured,
}

/// In-memory transport that records every payload it accepts.
pub struct RecordingTransport {
    name: &'static str,
    mode: TransportMode,
    sent: Mutex<Vec<NotificationPayload>>,
}

impl RecordingTransport {
    pub fn new(name: &'static str, mode: TransportMode) -> Arc<Self> {
        Arc::new(Self {
            name,
            mode,
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn sent(&self) -> Vec<NotificationPayload> {
        self.sent.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl ChannelTransport for RecordingTransport {
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_configured(&self) -> bool {
        self.mode != TransportMode::Unconfigured
    }

    async fn send(&self, payload: &NotificationPayload) -> Result<SendOutcome, TransportError> {
        match self.mode {
            TransportMode::Unconfigured => Ok(SendOutcome::NotConfigured),
            TransportMode::Fail => Err(WebhookError::HttpStatus(503).into()),
            TransportMode::Deliver => {
                self.sent.lock().unwrap().push(payload.clone());
                Ok(SendOutcome::Delivered)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Test app
// ---------------------------------------------------------------------------

/// Router plus handles on the test doubles behind it.
pub struct TestApp {
    pub router: Router,
    pub chat: Arc<RecordingTransport>,
    pub email: Arc<RecordingTransport>,
    pub bus: Arc<EventBus>,
}

impl TestApp {
    /// A fresh clone of the router, consumed by one request.
    pub fn app(&self) -> Router {
        self.router.clone()
    }
}

/// Options for [`build_test_app_with`].
pub struct TestOptions {
    pub chat: TransportMode,
    pub email: TransportMode,
    pub admin_token: Option<&'static str>,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            chat: TransportMode::Deliver,
            email: TransportMode::Deliver,
            admin_token: None,
        }
    }
}

/// Build the full application with delivering transports and no admin token.
pub fn build_test_app(pool: PgPool) -> TestApp {
    build_test_app_with(pool, TestOptions::default())
}

/// Build the full application router with all middleware layers.
///
/// Mirrors the router construction in `main.rs`, with recording transports
/// in place of the webhook and SMTP clients. The alert log is the real
/// Postgres table. A [`StockAlertRouter`] is spawned on the bus.
pub fn build_test_app_with(pool: PgPool, options: TestOptions) -> TestApp {
    let config = test_config(options.admin_token);
    let chat = RecordingTransport::new("discord", options.chat);
    let email = RecordingTransport::new("email", options.email);

    let dispatcher = Arc::new(NotificationDispatcher::new(
        chat.clone(),
        email.clone(),
        Arc::new(PgAlertLogStore::new(pool.clone())),
    ));

    let bus = Arc::new(EventBus::new(64));
    tokio::spawn(StockAlertRouter::new(Arc::clone(&dispatcher)).run(bus.subscribe()));

    let state = AppState {
        pool,
        config: Arc::new(config),
        event_bus: Arc::clone(&bus),
        dispatcher,
        webhook_preview: Some(TEST_WEBHOOK_PREVIEW.to_string()),
    };

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(ADMIN_TOKEN_HEADER)])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    let router = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state);

    TestApp {
        router,
        chat,
        email,
        bus,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn delete(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, json_request(Method::POST, uri, &body)).await
}

pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, json_request(Method::PUT, uri, &body)).await
}

pub fn json_request(method: Method, uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Collect the response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
