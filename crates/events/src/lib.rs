//! Stock notification plumbing.
//!
//! - [`EventBus`]: in-process publish/subscribe hub for committed stock
//!   changes, backed by `tokio::sync::broadcast`.
//! - [`NotificationDispatcher`]: decides when and where low-stock alerts go
//!   (automatic path with an in-memory dedupe cache, explicit path guarded by
//!   the durable alert log).
//! - [`delivery`]: external transports (chat webhook, SMTP, worker ingress).
//! - [`payload`]: the messages those transports carry.

pub mod alert_log;
pub mod bus;
pub mod delivery;
pub mod dispatcher;
pub mod payload;

pub use alert_log::{AlertLogStore, PgAlertLogStore, RecordOutcome};
pub use bus::EventBus;
pub use delivery::email::{EmailConfig, EmailDelivery};
pub use delivery::ingress::WorkerIngress;
pub use delivery::webhook::WebhookDelivery;
pub use delivery::{ChannelTransport, SendOutcome, TransportError};
pub use dispatcher::{
    AlertReceipt, AutomaticOutcome, DispatchError, ExplicitAlert, ExplicitOutcome,
    ExplicitRequest, NotificationDispatcher, ReportSummary,
};
