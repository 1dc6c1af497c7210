//! Postgres-backed [`Store`], delegating to the table repositories.

use async_trait::async_trait;
use venuebook_core::booking::BookingCategory;
use venuebook_core::roles::Role;
use venuebook_core::types::DbId;

use crate::models::booking::{Booking, BookingDecision, BookingFilter, CreateBooking, StatusCounts};
use crate::models::notification::{CreateNotification, Notification};
use crate::models::session::{CreateSession, UserSession};
use crate::models::user::{CreateUser, User};
use crate::repositories::{BookingRepo, NotificationRepo, SessionRepo, UserRepo};
use crate::store::{BookingStore, NotificationStore, SessionStore, Store, StoreResult, UserStore};
use crate::DbPool;

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, input: &CreateUser) -> StoreResult<User> {
        Ok(UserRepo::create(&self.pool, input).await?)
    }

    async fn find_user_by_id(&self, id: DbId) -> StoreResult<Option<User>> {
        Ok(UserRepo::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(UserRepo::find_by_email(&self.pool, email).await?)
    }

    async fn list_user_ids_by_role(&self, role: Role) -> StoreResult<Vec<DbId>> {
        Ok(UserRepo::list_ids_by_role(&self.pool, role).await?)
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn create_session(&self, input: &CreateSession) -> StoreResult<UserSession> {
        Ok(SessionRepo::create(&self.pool, input).await?)
    }

    async fn find_active_session(
        &self,
        refresh_token_hash: &str,
    ) -> StoreResult<Option<UserSession>> {
        Ok(SessionRepo::find_by_refresh_token_hash(&self.pool, refresh_token_hash).await?)
    }

    async fn revoke_session(&self, id: DbId) -> StoreResult<bool> {
        Ok(SessionRepo::revoke(&self.pool, id).await?)
    }

    async fn revoke_all_sessions(&self, user_id: DbId) -> StoreResult<u64> {
        Ok(SessionRepo::revoke_all_for_user(&self.pool, user_id).await?)
    }
}

#[async_trait]
impl BookingStore for PgStore {
    async fn create_booking(&self, input: &CreateBooking) -> StoreResult<Booking> {
        Ok(BookingRepo::create(&self.pool, input).await?)
    }

    async fn find_booking(&self, id: DbId) -> StoreResult<Option<Booking>> {
        Ok(BookingRepo::find_by_id(&self.pool, id).await?)
    }

    async fn find_booking_by_request_token(
        &self,
        user_id: DbId,
        request_token: &str,
    ) -> StoreResult<Option<Booking>> {
        Ok(BookingRepo::find_by_request_token(&self.pool, user_id, request_token).await?)
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> StoreResult<Vec<Booking>> {
        Ok(BookingRepo::list(&self.pool, filter).await?)
    }

    async fn update_booking_decision(
        &self,
        id: DbId,
        expected_version: i32,
        decision: &BookingDecision,
    ) -> StoreResult<Option<Booking>> {
        Ok(BookingRepo::apply_decision(&self.pool, id, expected_version, decision).await?)
    }

    async fn booking_status_counts(&self, user_id: Option<DbId>) -> StoreResult<StatusCounts> {
        Ok(BookingRepo::status_counts(&self.pool, user_id).await?)
    }

    async fn open_booking_count(&self, category: BookingCategory) -> StoreResult<i64> {
        Ok(BookingRepo::open_count_for_category(&self.pool, category).await?)
    }
}

#[async_trait]
impl NotificationStore for PgStore {
    async fn create_notification(&self, input: &CreateNotification) -> StoreResult<Notification> {
        Ok(NotificationRepo::create(&self.pool, input).await?)
    }

    async fn list_notifications(
        &self,
        user_id: DbId,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Notification>> {
        Ok(NotificationRepo::list_for_user(&self.pool, user_id, unread_only, limit, offset).await?)
    }

    async fn mark_notification_read(&self, id: DbId, user_id: DbId) -> StoreResult<bool> {
        Ok(NotificationRepo::mark_read(&self.pool, id, user_id).await?)
    }

    async fn mark_all_notifications_read(&self, user_id: DbId) -> StoreResult<u64> {
        Ok(NotificationRepo::mark_all_read(&self.pool, user_id).await?)
    }

    async fn unread_notification_count(&self, user_id: DbId) -> StoreResult<i64> {
        Ok(NotificationRepo::unread_count(&self.pool, user_id).await?)
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(crate::health_check(&self.pool).await?)
    }
}
