//! Booking entity model, DTOs, and list filter.

use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;
use venuebook_core::booking::{
    AdminFeedback, BookingCategory, BookingStatus, FacultyRecommendation, TargetKind,
};
use venuebook_core::roles::Role;
use venuebook_core::time_slot::SlotRef;
use venuebook_core::types::{DbId, Timestamp};

/// Default page size for booking listings.
pub const DEFAULT_LIMIT: i64 = 50;

/// Maximum page size for booking listings.
pub const MAX_LIMIT: i64 = 200;

/// A row from the `bookings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Booking {
    pub id: DbId,
    pub user_id: DbId,
    pub user_name: String,
    #[sqlx(try_from = "String")]
    pub user_role: Role,
    #[sqlx(try_from = "String")]
    pub target_kind: TargetKind,
    pub venue_id: DbId,
    pub venue_name: String,
    #[sqlx(try_from = "String")]
    pub category: BookingCategory,
    pub purpose: String,
    pub description: String,
    pub attendees: i32,
    pub time_slots: Vec<String>,
    pub target_audience: String,
    #[sqlx(try_from = "String")]
    pub status: BookingStatus,
    pub faculty_recommendation: Option<Json<FacultyRecommendation>>,
    pub admin_feedback: Option<Json<AdminFeedback>>,
    /// Client-generated idempotency key. Never echoed back.
    #[serde(skip_serializing)]
    pub request_token: Option<String>,
    pub version: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Booking {
    /// Parse the stored slot ids. Ids that no longer parse are skipped.
    pub fn slot_refs(&self) -> Vec<SlotRef> {
        self.time_slots
            .iter()
            .filter_map(|id| id.parse().ok())
            .collect()
    }

    pub fn admin_feedback(&self) -> Option<&AdminFeedback> {
        self.admin_feedback.as_ref().map(|f| &f.0)
    }
}

/// DTO for inserting a booking. All fields are already validated.
#[derive(Debug, Clone)]
pub struct CreateBooking {
    pub user_id: DbId,
    pub user_name: String,
    pub user_role: Role,
    pub target_kind: TargetKind,
    pub venue_id: DbId,
    pub venue_name: String,
    pub category: BookingCategory,
    pub purpose: String,
    pub description: String,
    pub attendees: i32,
    pub time_slots: Vec<String>,
    pub target_audience: String,
    pub status: BookingStatus,
    pub faculty_recommendation: Option<FacultyRecommendation>,
    pub request_token: Option<String>,
}

/// The single mutation a booking ever receives: an admin decision.
#[derive(Debug, Clone)]
pub struct BookingDecision {
    pub status: BookingStatus,
    pub admin_feedback: AdminFeedback,
}

/// Filter for listing bookings. `None` fields do not constrain the result.
///
/// Results are always ordered most-recent-first (`created_at DESC, id DESC`).
#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub user_id: Option<DbId>,
    pub status: Option<BookingStatus>,
    pub category: Option<BookingCategory>,
    pub target: Option<(TargetKind, DbId)>,
    /// Restrict to `pending` and `high-priority` bookings.
    pub open_only: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl BookingFilter {
    /// Effective page size, clamped to `1..=MAX_LIMIT`.
    pub fn clamped_limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    /// Effective offset, never negative.
    pub fn clamped_offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    /// In-process evaluation of the filter predicate (pagination excluded).
    pub fn matches(&self, booking: &Booking) -> bool {
        self.user_id.map_or(true, |id| booking.user_id == id)
            && self.status.map_or(true, |s| booking.status == s)
            && self.category.map_or(true, |c| booking.category == c)
            && self
                .target
                .map_or(true, |(kind, id)| booking.target_kind == kind && booking.venue_id == id)
            && (!self.open_only || booking.status.is_open())
    }
}

/// Number of bookings in each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: i64,
    pub high_priority: i64,
    pub approved: i64,
    pub rejected: i64,
}

impl StatusCounts {
    pub fn add(&mut self, status: BookingStatus, n: i64) {
        match status {
            BookingStatus::Pending => self.pending += n,
            BookingStatus::HighPriority => self.high_priority += n,
            BookingStatus::Approved => self.approved += n,
            BookingStatus::Rejected => self.rejected += n,
        }
    }

    pub fn total(&self) -> i64 {
        self.pending + self.high_priority + self.approved + self.rejected
    }

    pub fn open(&self) -> i64 {
        self.pending + self.high_priority
    }
}
