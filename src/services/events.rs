//! Session event bus
//!
//! Views that must refresh after a booking is created or cancelled subscribe
//! here instead of listening for global signals. Built on
//! `tokio::sync::broadcast`: each subscriber sees events in publication
//! order, and a lagging subscriber loses the oldest ones.

use tokio::sync::broadcast;
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};

/// Something other views may need to react to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A booking was created or cancelled; dashboards and lists reload.
    /// Always published together with `AvailabilityChanged`.
    BookingsChanged,
    /// Availability of a vehicle changed (`None`: any vehicle).
    AvailabilityChanged { vehicle_id: Option<i64> },
}

impl SessionEvent {
    /// Whether the availability of `vehicle_id` may be stale after this event
    pub fn affects_availability_of(&self, vehicle_id: i64) -> bool {
        match self {
            SessionEvent::BookingsChanged => false,
            SessionEvent::AvailabilityChanged { vehicle_id: None } => true,
            SessionEvent::AvailabilityChanged { vehicle_id: Some(id) } => *id == vehicle_id,
        }
    }
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish to current subscribers; returns how many received it.
    pub fn publish(&self, event: SessionEvent) -> usize {
        match self.tx.send(event) {
            Ok(n) => {
                tracing::debug!("Published {:?} to {} subscriber(s)", event, n);
                n
            }
            Err(_) => {
                tracing::debug!("Published {:?} with no subscribers", event);
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Subscription as a stream; lag notifications are dropped.
    pub fn stream(&self) -> impl Stream<Item = SessionEvent> {
        BroadcastStream::new(self.tx.subscribe()).filter_map(|res| res.ok())
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
