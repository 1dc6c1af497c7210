//! Event-to-notification routing engine.
//!
//! [`NotificationRouter`] consumes booking events from the bus and writes a
//! notification for every affected user: admins hear about new requests,
//! owners hear about decisions.

use std::sync::Arc;

use tokio::sync::broadcast;
use venuebook_core::events::{BOOKING_APPROVED, BOOKING_REJECTED, BOOKING_SUBMITTED};
use venuebook_core::notification::{self, NotificationDraft};
use venuebook_core::roles::Role;
use venuebook_core::types::DbId;
use venuebook_db::models::notification::CreateNotification;
use venuebook_db::{Store, StoreResult};
use venuebook_events::PortalEvent;

/// Payload keys shared with the booking handlers.
pub const KEY_BOOKING_ID: &str = "booking_id";
pub const KEY_OWNER_ID: &str = "owner_id";
pub const KEY_VENUE_NAME: &str = "venue_name";
pub const KEY_PURPOSE: &str = "purpose";
pub const KEY_HIGH_PRIORITY: &str = "high_priority";
pub const KEY_COMMENT: &str = "comment";

/// Routes booking events to user notifications.
pub struct NotificationRouter {
    store: Arc<dyn Store>,
}

impl NotificationRouter {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Run the main routing loop.
    ///
    /// Exits when the channel is closed, i.e. when the
    /// [`EventBus`](venuebook_events::EventBus) is dropped.
    pub async fn run(self, mut receiver: broadcast::Receiver<PortalEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = self.route_event(&event).await {
                        tracing::error!(
                            error = %e,
                            event_type = %event.event_type,
                            "Failed to route event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification router lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification router shutting down");
                    break;
                }
            }
        }
    }

    /// Write notifications for a single event. Returns how many were written.
    pub async fn route_event(&self, event: &PortalEvent) -> StoreResult<usize> {
        let Some(draft) = draft_for(event) else {
            tracing::debug!(event_type = %event.event_type, "No notification for event");
            return Ok(0);
        };

        let targets = self.determine_targets(event).await?;
        let booking_id = event.payload_id(KEY_BOOKING_ID).or(event.source_entity_id);

        for user_id in &targets {
            let input = CreateNotification {
                user_id: *user_id,
                title: draft.title.clone(),
                message: draft.message.clone(),
                kind: draft.kind,
                booking_id,
            };
            self.store.create_notification(&input).await?;
        }

        tracing::debug!(
            event_type = %event.event_type,
            recipients = targets.len(),
            "Notifications delivered"
        );
        Ok(targets.len())
    }

    async fn determine_targets(&self, event: &PortalEvent) -> StoreResult<Vec<DbId>> {
        match event.event_type.as_str() {
            BOOKING_SUBMITTED => self.store.list_user_ids_by_role(Role::Admin).await,
            BOOKING_APPROVED | BOOKING_REJECTED => {
                Ok(event.payload_id(KEY_OWNER_ID).into_iter().collect())
            }
            _ => Ok(vec![]),
        }
    }
}

/// Build the notification text for an event, or `None` if the event type
/// produces no notification or its payload is incomplete.
fn draft_for(event: &PortalEvent) -> Option<NotificationDraft> {
    let venue_name = event.payload_str(KEY_VENUE_NAME)?;
    match event.event_type.as_str() {
        BOOKING_SUBMITTED => {
            let purpose = event.payload_str(KEY_PURPOSE).unwrap_or_default();
            let high_priority = event
                .payload
                .get(KEY_HIGH_PRIORITY)
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
            Some(notification::booking_submitted(venue_name, purpose, high_priority))
        }
        BOOKING_APPROVED => Some(notification::booking_approved(
            venue_name,
            event.payload_str(KEY_COMMENT).unwrap_or_default(),
        )),
        BOOKING_REJECTED => Some(notification::booking_rejected(
            venue_name,
            event.payload_str(KEY_COMMENT).unwrap_or_default(),
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use venuebook_core::events::ENTITY_BOOKING;
    use venuebook_core::notification::NotificationKind;
    use venuebook_db::models::user::CreateUser;
    use venuebook_db::{MemoryStore, NotificationStore, UserStore};
    use venuebook_events::EventBus;

    use super::*;

    async fn user(store: &MemoryStore, email: &str, role: Role) -> DbId {
        store
            .create_user(&CreateUser {
                name: email.to_string(),
                email: email.to_string(),
                password_hash: "x".to_string(),
                role,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn submission_notifies_every_admin() {
        let store = Arc::new(MemoryStore::new());
        let a1 = user(&store, "a1@edu.com", Role::Admin).await;
        let a2 = user(&store, "a2@edu.com", Role::Admin).await;
        let student = user(&store, "s@edu.com", Role::Student).await;
        let router = NotificationRouter::new(store.clone());

        let event = PortalEvent::new(BOOKING_SUBMITTED)
            .with_source(ENTITY_BOOKING, 7)
            .with_actor(student)
            .with_payload(json!({
                KEY_BOOKING_ID: 7,
                KEY_OWNER_ID: student,
                KEY_VENUE_NAME: "MPH",
                KEY_PURPOSE: "Annual Tech Fest",
                KEY_HIGH_PRIORITY: true,
            }));

        assert_eq!(router.route_event(&event).await.unwrap(), 2);
        for admin in [a1, a2] {
            let list = store.list_notifications(admin, false, 10, 0).await.unwrap();
            assert_eq!(list.len(), 1);
            assert_eq!(list[0].kind, NotificationKind::Warning);
            assert_eq!(list[0].booking_id, Some(7));
        }
        assert_eq!(store.unread_notification_count(student).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn rejection_notifies_only_the_owner() {
        let store = Arc::new(MemoryStore::new());
        let admin = user(&store, "a@edu.com", Role::Admin).await;
        let owner = user(&store, "s@edu.com", Role::Student).await;
        let router = NotificationRouter::new(store.clone());

        let event = PortalEvent::new(BOOKING_REJECTED)
            .with_actor(admin)
            .with_payload(json!({
                KEY_BOOKING_ID: 3,
                KEY_OWNER_ID: owner,
                KEY_VENUE_NAME: "LT1",
                KEY_COMMENT: "Room conflict",
            }));

        assert_eq!(router.route_event(&event).await.unwrap(), 1);
        let list = store.list_notifications(owner, false, 10, 0).await.unwrap();
        assert_eq!(list[0].title, "Booking Rejected");
        assert!(list[0].message.ends_with("Room conflict"));
        assert_eq!(store.unread_notification_count(admin).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unknown_events_are_ignored() {
        let store = Arc::new(MemoryStore::new());
        let router = NotificationRouter::new(store);
        let event = PortalEvent::new("booking.archived")
            .with_payload(json!({ KEY_VENUE_NAME: "LT1" }));
        assert_eq!(router.route_event(&event).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn run_exits_when_bus_is_dropped() {
        let store = Arc::new(MemoryStore::new());
        let owner = user(&store, "s@edu.com", Role::Student).await;
        let bus = EventBus::default();
        let handle = tokio::spawn(NotificationRouter::new(store.clone()).run(bus.subscribe()));

        bus.publish(PortalEvent::new(BOOKING_APPROVED).with_payload(json!({
            KEY_OWNER_ID: owner,
            KEY_VENUE_NAME: "CR101",
            KEY_COMMENT: "Enjoy",
        })));
        drop(bus);

        handle.await.unwrap();
        assert_eq!(store.unread_notification_count(owner).await.unwrap(), 1);
    }
}
