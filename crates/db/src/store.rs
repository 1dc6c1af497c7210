//! Backend-neutral store traits.
//!
//! Handlers depend on `Arc<dyn Store>` rather than a concrete pool so the
//! same request paths run against Postgres in production and against
//! [`MemoryStore`](crate::memory::MemoryStore) in development and tests.

use async_trait::async_trait;
use venuebook_core::booking::BookingCategory;
use venuebook_core::roles::Role;
use venuebook_core::types::DbId;

use crate::error::StoreError;
use crate::models::booking::{Booking, BookingDecision, BookingFilter, CreateBooking, StatusCounts};
use crate::models::notification::{CreateNotification, Notification};
use crate::models::session::{CreateSession, UserSession};
use crate::models::user::{CreateUser, User};

pub type StoreResult<T> = Result<T, StoreError>;

/// Unique constraint guarding user emails.
pub const UQ_USERS_EMAIL: &str = "uq_users_email";

/// Unique index guarding `(user_id, request_token)` on bookings.
pub const UQ_BOOKINGS_REQUEST_TOKEN: &str = "uq_bookings_request_token";

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user. A taken email fails with [`UQ_USERS_EMAIL`].
    async fn create_user(&self, input: &CreateUser) -> StoreResult<User>;

    async fn find_user_by_id(&self, id: DbId) -> StoreResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn list_user_ids_by_role(&self, role: Role) -> StoreResult<Vec<DbId>>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_session(&self, input: &CreateSession) -> StoreResult<UserSession>;

    /// Find a session by refresh token hash, ignoring revoked or expired ones.
    async fn find_active_session(&self, refresh_token_hash: &str)
        -> StoreResult<Option<UserSession>>;

    async fn revoke_session(&self, id: DbId) -> StoreResult<bool>;

    async fn revoke_all_sessions(&self, user_id: DbId) -> StoreResult<u64>;
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Insert a booking. A reused request token fails with
    /// [`UQ_BOOKINGS_REQUEST_TOKEN`].
    async fn create_booking(&self, input: &CreateBooking) -> StoreResult<Booking>;

    async fn find_booking(&self, id: DbId) -> StoreResult<Option<Booking>>;

    async fn find_booking_by_request_token(
        &self,
        user_id: DbId,
        request_token: &str,
    ) -> StoreResult<Option<Booking>>;

    /// List bookings matching `filter`, most recent first.
    async fn list_bookings(&self, filter: &BookingFilter) -> StoreResult<Vec<Booking>>;

    /// Apply a decision if the stored version still equals `expected_version`.
    ///
    /// Returns `None` when the version check fails.
    async fn update_booking_decision(
        &self,
        id: DbId,
        expected_version: i32,
        decision: &BookingDecision,
    ) -> StoreResult<Option<Booking>>;

    async fn booking_status_counts(&self, user_id: Option<DbId>) -> StoreResult<StatusCounts>;

    async fn open_booking_count(&self, category: BookingCategory) -> StoreResult<i64>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn create_notification(&self, input: &CreateNotification) -> StoreResult<Notification>;

    async fn list_notifications(
        &self,
        user_id: DbId,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Notification>>;

    /// Returns `false` if the notification does not belong to `user_id`.
    async fn mark_notification_read(&self, id: DbId, user_id: DbId) -> StoreResult<bool>;

    async fn mark_all_notifications_read(&self, user_id: DbId) -> StoreResult<u64>;

    async fn unread_notification_count(&self, user_id: DbId) -> StoreResult<i64>;
}

/// Everything the API needs from a persistence backend.
#[async_trait]
pub trait Store: UserStore + SessionStore + BookingStore + NotificationStore {
    /// Short backend name for logs (`"postgres"`, `"memory"`).
    fn backend(&self) -> &'static str;

    /// Confirm the backend is reachable.
    async fn health_check(&self) -> StoreResult<()>;
}
