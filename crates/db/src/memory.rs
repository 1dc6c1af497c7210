//! In-memory [`Store`] for local development and tests.
//!
//! Enforces the same unique constraints and optimistic version check as the
//! Postgres schema. Data is lost when the process exits.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use tokio::sync::RwLock;
use venuebook_core::booking::BookingCategory;
use venuebook_core::roles::Role;
use venuebook_core::types::DbId;

use crate::error::StoreError;
use crate::models::booking::{Booking, BookingDecision, BookingFilter, CreateBooking, StatusCounts};
use crate::models::notification::{CreateNotification, Notification};
use crate::models::session::{CreateSession, UserSession};
use crate::models::user::{CreateUser, User};
use crate::store::{
    BookingStore, NotificationStore, SessionStore, Store, StoreResult, UserStore,
    UQ_BOOKINGS_REQUEST_TOKEN, UQ_USERS_EMAIL,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    sessions: Vec<UserSession>,
    /// Kept newest-first so listings need no sort.
    bookings: Vec<Booking>,
    notifications: Vec<Notification>,
    next_user_id: DbId,
    next_session_id: DbId,
    next_booking_id: DbId,
    next_notification_id: DbId,
}

fn next_id(counter: &mut DbId) -> DbId {
    *counter += 1;
    *counter
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, input: &CreateUser) -> StoreResult<User> {
        let mut t = self.tables.write().await;
        if t.users.iter().any(|u| u.email == input.email) {
            return Err(StoreError::UniqueViolation(UQ_USERS_EMAIL.to_string()));
        }
        let now = Utc::now();
        let user = User {
            id: next_id(&mut t.next_user_id),
            name: input.name.clone(),
            email: input.email.clone(),
            password_hash: input.password_hash.clone(),
            role: input.role,
            created_at: now,
            updated_at: now,
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: DbId) -> StoreResult<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_user_ids_by_role(&self, role: Role) -> StoreResult<Vec<DbId>> {
        let t = self.tables.read().await;
        Ok(t.users.iter().filter(|u| u.role == role).map(|u| u.id).collect())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create_session(&self, input: &CreateSession) -> StoreResult<UserSession> {
        let mut t = self.tables.write().await;
        let session = UserSession {
            id: next_id(&mut t.next_session_id),
            user_id: input.user_id,
            refresh_token_hash: input.refresh_token_hash.clone(),
            expires_at: input.expires_at,
            is_revoked: false,
            created_at: Utc::now(),
        };
        t.sessions.push(session.clone());
        Ok(session)
    }

    async fn find_active_session(
        &self,
        refresh_token_hash: &str,
    ) -> StoreResult<Option<UserSession>> {
        let now = Utc::now();
        let t = self.tables.read().await;
        Ok(t.sessions
            .iter()
            .find(|s| s.refresh_token_hash == refresh_token_hash && s.is_active(now))
            .cloned())
    }

    async fn revoke_session(&self, id: DbId) -> StoreResult<bool> {
        let mut t = self.tables.write().await;
        match t.sessions.iter_mut().find(|s| s.id == id && !s.is_revoked) {
            Some(session) => {
                session.is_revoked = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn revoke_all_sessions(&self, user_id: DbId) -> StoreResult<u64> {
        let mut t = self.tables.write().await;
        let mut revoked = 0;
        for session in t
            .sessions
            .iter_mut()
            .filter(|s| s.user_id == user_id && !s.is_revoked)
        {
            session.is_revoked = true;
            revoked += 1;
        }
        Ok(revoked)
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn create_booking(&self, input: &CreateBooking) -> StoreResult<Booking> {
        let mut t = self.tables.write().await;
        if let Some(token) = &input.request_token {
            let taken = t.bookings.iter().any(|b| {
                b.user_id == input.user_id && b.request_token.as_deref() == Some(token.as_str())
            });
            if taken {
                return Err(StoreError::UniqueViolation(
                    UQ_BOOKINGS_REQUEST_TOKEN.to_string(),
                ));
            }
        }
        let now = Utc::now();
        let booking = Booking {
            id: next_id(&mut t.next_booking_id),
            user_id: input.user_id,
            user_name: input.user_name.clone(),
            user_role: input.user_role,
            target_kind: input.target_kind,
            venue_id: input.venue_id,
            venue_name: input.venue_name.clone(),
            category: input.category,
            purpose: input.purpose.clone(),
            description: input.description.clone(),
            attendees: input.attendees,
            time_slots: input.time_slots.clone(),
            target_audience: input.target_audience.clone(),
            status: input.status,
            faculty_recommendation: input.faculty_recommendation.clone().map(Json),
            admin_feedback: None,
            request_token: input.request_token.clone(),
            version: 1,
            created_at: now,
            updated_at: now,
        };
        t.bookings.insert(0, booking.clone());
        Ok(booking)
    }

    async fn find_booking(&self, id: DbId) -> StoreResult<Option<Booking>> {
        let t = self.tables.read().await;
        Ok(t.bookings.iter().find(|b| b.id == id).cloned())
    }

    async fn find_booking_by_request_token(
        &self,
        user_id: DbId,
        request_token: &str,
    ) -> StoreResult<Option<Booking>> {
        let t = self.tables.read().await;
        Ok(t.bookings
            .iter()
            .find(|b| b.user_id == user_id && b.request_token.as_deref() == Some(request_token))
            .cloned())
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> StoreResult<Vec<Booking>> {
        let t = self.tables.read().await;
        Ok(t.bookings
            .iter()
            .filter(|b| filter.matches(b))
            .skip(filter.clamped_offset() as usize)
            .take(filter.clamped_limit() as usize)
            .cloned()
            .collect())
    }

    async fn update_booking_decision(
        &self,
        id: DbId,
        expected_version: i32,
        decision: &BookingDecision,
    ) -> StoreResult<Option<Booking>> {
        let mut t = self.tables.write().await;
        let Some(booking) = t.bookings.iter_mut().find(|b| {
            b.id == id && b.version == expected_version && b.admin_feedback.is_none()
        }) else {
            return Ok(None);
        };
        booking.status = decision.status;
        booking.admin_feedback = Some(Json(decision.admin_feedback.clone()));
        booking.version += 1;
        booking.updated_at = Utc::now();
        Ok(Some(booking.clone()))
    }

    async fn booking_status_counts(&self, user_id: Option<DbId>) -> StoreResult<StatusCounts> {
        let t = self.tables.read().await;
        let mut counts = StatusCounts::default();
        for booking in t
            .bookings
            .iter()
            .filter(|b| user_id.map_or(true, |id| b.user_id == id))
        {
            counts.add(booking.status, 1);
        }
        Ok(counts)
    }

    async fn open_booking_count(&self, category: BookingCategory) -> StoreResult<i64> {
        let t = self.tables.read().await;
        Ok(t.bookings
            .iter()
            .filter(|b| b.category == category && b.status.is_open())
            .count() as i64)
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn create_notification(&self, input: &CreateNotification) -> StoreResult<Notification> {
        let mut t = self.tables.write().await;
        let notification = Notification {
            id: next_id(&mut t.next_notification_id),
            user_id: input.user_id,
            title: input.title.clone(),
            message: input.message.clone(),
            kind: input.kind,
            booking_id: input.booking_id,
            is_read: false,
            read_at: None,
            created_at: Utc::now(),
        };
        t.notifications.insert(0, notification.clone());
        Ok(notification)
    }

    async fn list_notifications(
        &self,
        user_id: DbId,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Notification>> {
        let t = self.tables.read().await;
        Ok(t.notifications
            .iter()
            .filter(|n| n.user_id == user_id && (!unread_only || !n.is_read))
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn mark_notification_read(&self, id: DbId, user_id: DbId) -> StoreResult<bool> {
        let mut t = self.tables.write().await;
        match t
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
        {
            Some(notification) => {
                if !notification.is_read {
                    notification.is_read = true;
                    notification.read_at = Some(Utc::now());
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_notifications_read(&self, user_id: DbId) -> StoreResult<u64> {
        let mut t = self.tables.write().await;
        let now = Utc::now();
        let mut marked = 0;
        for notification in t
            .notifications
            .iter_mut()
            .filter(|n| n.user_id == user_id && !n.is_read)
        {
            notification.is_read = true;
            notification.read_at = Some(now);
            marked += 1;
        }
        Ok(marked)
    }

    async fn unread_notification_count(&self, user_id: DbId) -> StoreResult<i64> {
        let t = self.tables.read().await;
        Ok(t.notifications
            .iter()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count() as i64)
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}
