//! Repository for the `bookings` table.

use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use venuebook_core::booking::{BookingCategory, BookingStatus, STATUS_HIGH_PRIORITY, STATUS_PENDING};
use venuebook_core::types::DbId;

use crate::models::booking::{Booking, BookingDecision, BookingFilter, CreateBooking, StatusCounts};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, user_name, user_role, target_kind, venue_id, venue_name, \
                       category, purpose, description, attendees, time_slots, target_audience, \
                       status, faculty_recommendation, admin_feedback, request_token, version, \
                       created_at, updated_at";

/// Provides CRUD operations for bookings.
///
/// Bookings are never deleted; the only update is [`BookingRepo::apply_decision`].
pub struct BookingRepo;

impl BookingRepo {
    /// Insert a new booking, returning the created row.
    ///
    /// Fails with a `uq_bookings_request_token` unique violation when the
    /// user already submitted with the same request token.
    pub async fn create(pool: &PgPool, input: &CreateBooking) -> Result<Booking, sqlx::Error> {
        let query = format!(
            "INSERT INTO bookings (user_id, user_name, user_role, target_kind, venue_id,
                venue_name, category, purpose, description, attendees, time_slots,
                target_audience, status, faculty_recommendation, request_token)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Booking>(&query)
            .bind(input.user_id)
            .bind(&input.user_name)
            .bind(input.user_role.as_str())
            .bind(input.target_kind.as_str())
            .bind(input.venue_id)
            .bind(&input.venue_name)
            .bind(input.category.as_str())
            .bind(&input.purpose)
            .bind(&input.description)
            .bind(input.attendees)
            .bind(&input.time_slots)
            .bind(&input.target_audience)
            .bind(input.status.as_str())
            .bind(input.faculty_recommendation.as_ref().map(Json))
            .bind(&input.request_token)
            .fetch_one(pool)
            .await
    }

    /// Find a booking by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Booking>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM bookings WHERE id = $1");
        sqlx::query_as::<_, Booking>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find the booking a user previously submitted with `request_token`.
    pub async fn find_by_request_token(
        pool: &PgPool,
        user_id: DbId,
        request_token: &str,
    ) -> Result<Option<Booking>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM bookings WHERE user_id = $1 AND request_token = $2");
        sqlx::query_as::<_, Booking>(&query)
            .bind(user_id)
            .bind(request_token)
            .fetch_optional(pool)
            .await
    }

    /// List bookings matching `filter`, most recent first.
    pub async fn list(pool: &PgPool, filter: &BookingFilter) -> Result<Vec<Booking>, sqlx::Error> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {COLUMNS} FROM bookings WHERE true"));

        if let Some(user_id) = filter.user_id {
            qb.push(" AND user_id = ").push_bind(user_id);
        }
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(category) = filter.category {
            qb.push(" AND category = ").push_bind(category.as_str());
        }
        if let Some((kind, venue_id)) = filter.target {
            qb.push(" AND target_kind = ").push_bind(kind.as_str());
            qb.push(" AND venue_id = ").push_bind(venue_id);
        }
        if filter.open_only {
            qb.push(" AND status IN (")
                .push_bind(STATUS_PENDING)
                .push(", ")
                .push_bind(STATUS_HIGH_PRIORITY)
                .push(")");
        }

        qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(filter.clamped_limit())
            .push(" OFFSET ")
            .push_bind(filter.clamped_offset());

        qb.build_query_as::<Booking>().fetch_all(pool).await
    }

    /// Record an admin decision with an optimistic version check.
    ///
    /// Returns `None` when no row with `id` has version `expected_version`,
    /// i.e. the booking is missing or was modified since it was read.
    pub async fn apply_decision(
        pool: &PgPool,
        id: DbId,
        expected_version: i32,
        decision: &BookingDecision,
    ) -> Result<Option<Booking>, sqlx::Error> {
        let query = format!(
            "UPDATE bookings SET
                status = $3,
                admin_feedback = $4,
                version = version + 1,
                updated_at = NOW()
             WHERE id = $1 AND version = $2 AND admin_feedback IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Booking>(&query)
            .bind(id)
            .bind(expected_version)
            .bind(decision.status.as_str())
            .bind(Json(&decision.admin_feedback))
            .fetch_optional(pool)
            .await
    }

    /// Count bookings per status, optionally for a single user.
    pub async fn status_counts(
        pool: &PgPool,
        user_id: Option<DbId>,
    ) -> Result<StatusCounts, sqlx::Error> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM bookings
             WHERE ($1::BIGINT IS NULL OR user_id = $1)
             GROUP BY status",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        let mut counts = StatusCounts::default();
        for (status, n) in rows {
            let status: BookingStatus = status
                .parse()
                .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
            counts.add(status, n);
        }
        Ok(counts)
    }

    /// Count open bookings in `category`.
    pub async fn open_count_for_category(
        pool: &PgPool,
        category: BookingCategory,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings
             WHERE category = $1 AND status IN ($2, $3)",
        )
        .bind(category.as_str())
        .bind(STATUS_PENDING)
        .bind(STATUS_HIGH_PRIORITY)
        .fetch_one(pool)
        .await
    }
}
