//! Event-to-dispatch routing.
//!
//! [`StockAlertRouter`] consumes [`StockChangeEvent`]s from the broadcast
//! channel and spawns one automatic dispatch per event, so a slow webhook
//! never holds up the next event. Spawned dispatches are tracked and drained
//! when the bus closes.

use std::sync::Arc;

use stockwatch_core::stock::StockChangeEvent;
use stockwatch_events::{AutomaticOutcome, NotificationDispatcher};
use tokio::sync::broadcast;
use tokio_util::task::TaskTracker;

/// Routes committed stock changes to the automatic dispatch path.
pub struct StockAlertRouter {
    dispatcher: Arc<NotificationDispatcher>,
    tasks: TaskTracker,
}

impl StockAlertRouter {
    pub fn new(dispatcher: Arc<NotificationDispatcher>) -> Self {
        Self {
            dispatcher,
            tasks: TaskTracker::new(),
        }
    }

    /// Run the routing loop.
    ///
    /// Exits when the channel is closed (i.e. the
    /// [`EventBus`](stockwatch_events::EventBus) is dropped), after every
    /// in-flight dispatch has finished.
    pub async fn run(self, mut receiver: broadcast::Receiver<StockChangeEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => self.spawn_dispatch(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Stock alert router lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, stock alert router shutting down");
                    break;
                }
            }
        }

        self.tasks.close();
        self.tasks.wait().await;
    }

    fn spawn_dispatch(&self, event: StockChangeEvent) {
        if !event.below_threshold {
            return;
        }

        let dispatcher = Arc::clone(&self.dispatcher);
        self.tasks.spawn(async move {
            match dispatcher.dispatch_automatic(&event).await {
                AutomaticOutcome::Sent { dedupe_key } => {
                    tracing::info!(product_id = event.product_id, %dedupe_key, "Stock alert sent");
                }
                AutomaticOutcome::Suppressed { .. } | AutomaticOutcome::Skipped => {}
                AutomaticOutcome::NotConfigured { .. } => {
                    tracing::debug!(product_id = event.product_id, "Chat channel not configured");
                }
                AutomaticOutcome::Failed { dedupe_key } => {
                    tracing::warn!(product_id = event.product_id, %dedupe_key, "Stock alert not delivered");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use stockwatch_core::channels::AlertChannel;
    use stockwatch_db::models::alert_log::CreateAlertLog;
    use stockwatch_events::payload::NotificationPayload;
    use stockwatch_events::{
        AlertLogStore, ChannelTransport, EventBus, RecordOutcome, SendOutcome, TransportError,
    };

    use super::*;

    #[derive(Default)]
    struct CountingTransport {
        sends: AtomicUsize,
    }

    #[async_trait]
    impl ChannelTransport for CountingTransport {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn is_configured(&self) -> bool {
            true
        }

        async fn send(&self, _payload: &NotificationPayload) -> Result<SendOutcome, TransportError> {
            self.sends.fetch_add(1, Ordering::SeqCst);
            Ok(SendOutcome::Delivered)
        }
    }

    struct NoopLog;

    #[async_trait]
    impl AlertLogStore for NoopLog {
        async fn exists(&self, _: AlertChannel, _: &str) -> Result<bool, sqlx::Error> {
            Ok(false)
        }

        async fn record(&self, _: &CreateAlertLog) -> Result<RecordOutcome, sqlx::Error> {
            Ok(RecordOutcome::Recorded { id: 1 })
        }
    }

    #[tokio::test]
    async fn dispatches_low_stock_events_and_drains_on_close() {
        let chat = Arc::new(CountingTransport::default());
        let email = Arc::new(CountingTransport::default());
        let dispatcher = Arc::new(NotificationDispatcher::new(
            chat.clone(),
            email,
            Arc::new(NoopLog),
        ));

        let bus = EventBus::new(16);
        let handle = tokio::spawn(StockAlertRouter::new(dispatcher).run(bus.subscribe()));

        bus.publish(StockChangeEvent::new(1, "A", "Above", 20, 10));
        bus.publish(StockChangeEvent::new(2, "B", "Below", 3, 10));
        drop(bus);

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("router did not shut down")
            .unwrap();

        assert_eq!(chat.sends.load(Ordering::SeqCst), 1);
    }
}
