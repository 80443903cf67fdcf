//! In-memory fan-out of change notifications to WebSocket clients.
//!
//! Delivery is at-most-once with no replay: a late subscriber sees only
//! what is published after it subscribed, and a lagging one loses the
//! messages it fell behind on.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Messages buffered per subscriber before it starts lagging.
pub const BUS_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Event {
    #[serde(rename = "transaction:new")]
    TransactionNew,
    #[serde(rename = "transaction:updated")]
    TransactionUpdated,
    #[serde(rename = "transaction:deleted")]
    TransactionDeleted,
    #[serde(rename = "policies:updated")]
    PoliciesUpdated,
}

#[derive(Serialize)]
struct Frame<'a, T> {
    event: Event,
    data: &'a T,
}

#[derive(Clone)]
pub struct NotificationBus {
    tx: broadcast::Sender<String>,
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new(BUS_CAPACITY)
    }
}

impl NotificationBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Serialize `{event, data}` and send it to every live subscriber.
    /// Returns how many subscribers it reached; never blocks.
    pub fn publish<T: Serialize>(&self, event: Event, data: &T) -> usize {
        let frame = match serde_json::to_string(&Frame { event, data }) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(?event, error = %e, "failed to serialize notification");
                return 0;
            }
        };
        // An Err here only means nobody is listening.
        let reached = self.tx.send(frame).unwrap_or(0);
        debug!(?event, reached, "published notification");
        reached
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
