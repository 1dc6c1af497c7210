//! Booking lifecycle events and the broadcast channel that carries them.
//!
//! Booking handlers publish a [`PortalEvent`] after every submission and
//! admin decision has been stored. The notification router is the main
//! subscriber and turns each event into inbox rows for admins or the
//! booking owner. Publishing never blocks a request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use venuebook_core::types::DbId;

// ---------------------------------------------------------------------------
// PortalEvent
// ---------------------------------------------------------------------------

/// Something that happened to a booking.
///
/// Handlers put the fields a subscriber needs to word a notification (venue
/// name, owner id, admin comment) in `payload`, so routing never has to read
/// the booking back from the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalEvent {
    /// One of the `BOOKING_*` names in `venuebook_core::events`.
    pub event_type: String,

    /// Always `"booking"` for events published today.
    pub source_entity_type: Option<String>,

    pub source_entity_id: Option<DbId>,

    /// Submitter for `booking.submitted`, deciding admin otherwise.
    pub actor_user_id: Option<DbId>,

    /// Keyed by the `KEY_*` constants of the notification router.
    pub payload: serde_json::Value,

    pub timestamp: DateTime<Utc>,
}

impl PortalEvent {
    /// An event with an empty payload, stamped now.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            source_entity_type: None,
            source_entity_id: None,
            actor_user_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// Record the booking the event is about.
    pub fn with_source(mut self, entity_type: impl Into<String>, entity_id: DbId) -> Self {
        self.source_entity_type = Some(entity_type.into());
        self.source_entity_id = Some(entity_id);
        self
    }

    /// Record who caused the event.
    pub fn with_actor(mut self, user_id: DbId) -> Self {
        self.actor_user_id = Some(user_id);
        self
    }

    /// Replace the payload.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Read a string field from the payload, if present.
    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(|v| v.as_str())
    }

    /// Read an id field from the payload, if present.
    pub fn payload_id(&self, key: &str) -> Option<DbId> {
        self.payload.get(key).and_then(|v| v.as_i64())
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Events buffered per subscriber before the oldest are dropped.
const DEFAULT_CAPACITY: usize = 1024;

/// Fan-out channel between the booking handlers and their subscribers.
///
/// Lives in `AppState` behind an `Arc`. Dropping the last handle closes the
/// channel, which is how the notification router learns to stop during
/// shutdown.
///
/// ```rust
/// use venuebook_events::bus::{EventBus, PortalEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(PortalEvent::new("booking.submitted"));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<PortalEvent>,
}

impl EventBus {
    /// A bus buffering `capacity` events per subscriber.
    ///
    /// A subscriber that falls further behind sees `RecvError::Lagged` and
    /// misses the overwritten events; for the notification router that means
    /// missing inbox rows, never a failed booking.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Hand `event` to every current subscriber. With none, it is dropped.
    pub fn publish(&self, event: PortalEvent) {
        // A SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Receive every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<PortalEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
