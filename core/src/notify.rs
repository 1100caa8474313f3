//! Notification fan-out.
//!
//! Order state changes committed by sellers are broadcast to every connected
//! observer. Delivery is best-effort: emitting never fails, and an observer
//! that falls behind skips the events it missed.
//!
//! ```text
//! LifecycleEngine ──emit──► BroadcastNotifier ──► Observer (ws client 1)
//!                                            ├──► Observer (ws client 2)
//!                                            └──► ...
//! ```

use crate::metrics;
use crate::types::{ListingId, OrderId, OrderStatus};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Default number of events buffered per observer.
pub const DEFAULT_CAPACITY: usize = 256;

/// An order state change.
///
/// Serializes as `{"event": "orderUpdated", "payload": {...}}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum OrderEvent {
    /// A seller moved an order to a new status
    #[serde(rename = "orderUpdated", rename_all = "camelCase")]
    OrderUpdated {
        /// Order that changed
        order_id: OrderId,
        /// New status
        status: OrderStatus,
        /// Listing the order is for
        listing_id: ListingId,
    },
    /// A seller cancelled an order
    #[serde(rename = "orderDeleted", rename_all = "camelCase")]
    OrderDeleted {
        /// Order that was removed
        order_id: OrderId,
        /// Listing the order was for
        listing_id: ListingId,
    },
}

impl OrderEvent {
    /// Event name as sent on the wire.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::OrderUpdated { .. } => "orderUpdated",
            Self::OrderDeleted { .. } => "orderDeleted",
        }
    }
}

/// Sink for order events.
pub trait Notifier: Send + Sync {
    /// Publishes an event to all current observers. Never fails.
    fn emit(&self, event: OrderEvent);
}

/// Topic-less broadcast over a tokio channel.
#[derive(Clone, Debug)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<OrderEvent>,
    observers: Arc<AtomicUsize>,
}

impl BroadcastNotifier {
    /// Creates a notifier buffering up to `capacity` events per observer.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            observers: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Registers a new observer.
    #[must_use]
    pub fn subscribe(&self) -> Observer {
        let count = self.observers.fetch_add(1, Ordering::SeqCst) + 1;
        info!(observers = count, "Observer connected");
        metrics::record_observers(count);
        Observer {
            receiver: self.sender.subscribe(),
            observers: Arc::clone(&self.observers),
        }
    }

    /// Number of connected observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.load(Ordering::SeqCst)
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Notifier for BroadcastNotifier {
    fn emit(&self, event: OrderEvent) {
        match self.sender.send(event) {
            Ok(delivered) => debug!(delivered, "Order event broadcast"),
            Err(broadcast::error::SendError(event)) => {
                debug!(event = event.name(), "No observers connected, event dropped");
            }
        }
    }
}

/// One connected observer. Dropping it leaves the broadcast.
#[derive(Debug)]
pub struct Observer {
    receiver: broadcast::Receiver<OrderEvent>,
    observers: Arc<AtomicUsize>,
}

impl Observer {
    /// Waits for the next event. Returns `None` once the notifier is gone.
    pub async fn next(&mut self) -> Option<OrderEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Observer lagging, skipped events");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for Observer {
    fn drop(&mut self) {
        let count = self
            .observers
            .fetch_sub(1, Ordering::SeqCst)
            .saturating_sub(1);
        info!(observers = count, "Observer disconnected");
        metrics::record_observers(count);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn updated() -> OrderEvent {
        OrderEvent::OrderUpdated {
            order_id: OrderId::new(),
            status: OrderStatus::Confirmed,
            listing_id: ListingId::new(),
        }
    }

    #[test]
    fn test_wire_format() {
        let order_id = OrderId::new();
        let listing_id = ListingId::new();
        let event = OrderEvent::OrderDeleted {
            order_id,
            listing_id,
        };

        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["event"], "orderDeleted");
        assert_eq!(json["payload"]["orderId"], order_id.to_string());
        assert_eq!(json["payload"]["listingId"], listing_id.to_string());
    }

    #[test]
    fn test_emit_without_observers_is_silent() {
        let notifier = BroadcastNotifier::default();
        notifier.emit(updated());
        assert_eq!(notifier.observer_count(), 0);
    }

    #[tokio::test]
    async fn test_every_observer_receives_event() {
        let notifier = BroadcastNotifier::new(8);
        let mut first = notifier.subscribe();
        let mut second = notifier.subscribe();
        assert_eq!(notifier.observer_count(), 2);

        let event = updated();
        notifier.emit(event.clone());

        assert_eq!(first.next().await, Some(event.clone()));
        assert_eq!(second.next().await, Some(event));

        drop(first);
        assert_eq!(notifier.observer_count(), 1);
    }

    #[tokio::test]
    async fn test_lagging_observer_skips_to_latest() {
        let notifier = BroadcastNotifier::new(2);
        let mut observer = notifier.subscribe();

        let events: Vec<OrderEvent> = (0..5).map(|_| updated()).collect();
        for event in &events {
            notifier.emit(event.clone());
        }

        assert_eq!(observer.next().await, Some(events[3].clone()));
        assert_eq!(observer.next().await, Some(events[4].clone()));
    }
}
