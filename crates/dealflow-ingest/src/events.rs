//! In-process notifications for newly published deals.
//!
//! Downstream consumers (push notifications, cache warmers) subscribe to the
//! bus; publishing never blocks on them and a lagging subscriber only loses
//! its own backlog.

use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Payload emitted once per successful approval, after the transaction
/// commits.
#[derive(Debug, Clone, Serialize)]
pub struct PublishedEvent {
    pub id: Uuid,
    pub title: String,
    pub price: Decimal,
    pub discount_percent: Decimal,
    pub image_url: Option<String>,
}

const CHANNEL_CAPACITY: usize = 256;

/// Broadcast bus for [`PublishedEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PublishedEvent>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Emits an event to all current subscribers. With no subscribers the
    /// event is dropped, which is fine: publication already happened in the
    /// database.
    pub fn publish(&self, event: PublishedEvent) {
        let receivers = self.sender.receiver_count();
        if self.sender.send(event).is_err() {
            tracing::debug!("published-deal event dropped (no subscribers)");
        } else {
            tracing::debug!(receivers, "published-deal event emitted");
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
