//! Notification entity model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use venuebook_core::notification::NotificationKind;
use venuebook_core::types::{DbId, Timestamp};

/// A row from the `notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub user_id: DbId,
    pub title: String,
    pub message: String,
    #[sqlx(try_from = "String")]
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub booking_id: Option<DbId>,
    pub is_read: bool,
    pub read_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// DTO for creating a notification.
#[derive(Debug, Clone)]
pub struct CreateNotification {
    pub user_id: DbId,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub booking_id: Option<DbId>,
}
