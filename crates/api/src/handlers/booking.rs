//! Handlers for the `/bookings` resource.
//!
//! Submission and adjudication run the core state machine
//! (`venuebook_core::booking`), persist through the [`Store`] traits, and
//! publish a [`PortalEvent`] for the notification router.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use venuebook_core::booking::{
    self, AdminFeedback, BookingCategory, BookingStatus, BookingTarget, Decision,
    FacultyRecommendation, SubmissionCheck, TargetKind,
};
use venuebook_core::catalog;
use venuebook_core::error::CoreError;
use venuebook_core::events::{
    BOOKING_APPROVED, BOOKING_REJECTED, BOOKING_SUBMITTED, ENTITY_BOOKING,
};
use venuebook_core::roles::Role;
use venuebook_core::time_slot::{any_clash, SlotRef};
use venuebook_core::types::DbId;
use venuebook_db::models::booking::{
    Booking, BookingDecision, BookingFilter, CreateBooking, MAX_LIMIT,
};
use venuebook_db::store::UQ_BOOKINGS_REQUEST_TOKEN;
use venuebook_db::Store;
use venuebook_events::PortalEvent;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAdmin, RequireSubmitter};
use crate::notifications::router::{
    KEY_BOOKING_ID, KEY_COMMENT, KEY_HIGH_PRIORITY, KEY_OWNER_ID, KEY_PURPOSE, KEY_VENUE_NAME,
};
use crate::query::parse_optional;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /bookings`.
///
/// Exactly one of `venue_id` / `package_id` must be set. Text fields default
/// to empty so that missing values are reported as validation errors.
#[derive(Debug, Deserialize)]
pub struct SubmitBookingRequest {
    pub venue_id: Option<DbId>,
    pub package_id: Option<DbId>,
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub attendees: i32,
    #[serde(default)]
    pub time_slots: Vec<String>,
    #[serde(default)]
    pub target_audience: String,
    /// Name of the recommending faculty member, if any.
    pub faculty_recommendation: Option<String>,
    /// Client-generated idempotency key.
    pub request_token: Option<String>,
}

/// Request body for `POST /bookings/{id}/approve` and `/reject`.
#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    #[serde(default)]
    pub comment: String,
}

/// Query parameters for `GET /bookings`.
#[derive(Debug, Default, Deserialize)]
pub struct BookingListParams {
    pub user_id: Option<DbId>,
    pub status: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub open_only: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/bookings
///
/// Submit a booking request. Returns 201 with the new booking, or 200 with
/// the existing one when `request_token` was already used by this user.
pub async fn submit_booking(
    RequireSubmitter(auth): RequireSubmitter,
    State(state): State<AppState>,
    Json(input): Json<SubmitBookingRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Booking>>)> {
    booking::ensure_can_submit(auth.role)?;

    let request_token = input
        .request_token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    if let Some(token) = &request_token {
        if let Some(existing) = state
            .store
            .find_booking_by_request_token(auth.user_id, token)
            .await?
        {
            tracing::debug!(booking_id = existing.id, "Replayed booking submission");
            return Ok((StatusCode::OK, Json(DataResponse { data: existing })));
        }
    }

    let target = resolve_target(input.venue_id, input.package_id)?;
    booking::validate_submission(&SubmissionCheck {
        target,
        purpose: &input.purpose,
        description: &input.description,
        target_audience: &input.target_audience,
        attendees: input.attendees,
        time_slots: &input.time_slots,
    })?;

    let user = state
        .store
        .find_user_by_id(auth.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User no longer exists".into())))?;

    let recommendation_text = input.faculty_recommendation.as_deref();
    let faculty = (user.role == Role::Faculty).then_some((user.id, user.name.as_str()));
    let status = booking::initial_status(recommendation_text);

    let create = CreateBooking {
        user_id: user.id,
        user_name: user.name.clone(),
        user_role: user.role,
        target_kind: target.kind(),
        venue_id: target.id(),
        venue_name: target.name().to_string(),
        category: target.category(),
        purpose: input.purpose.trim().to_string(),
        description: input.description.trim().to_string(),
        attendees: input.attendees,
        time_slots: input.time_slots.clone(),
        target_audience: input.target_audience.trim().to_string(),
        status,
        faculty_recommendation: FacultyRecommendation::from_text(recommendation_text, faculty),
        request_token: request_token.clone(),
    };

    let created = match state.store.create_booking(&create).await {
        Ok(created) => created,
        // A concurrent replay of the same submission won the insert.
        Err(e) if e.is_unique_violation_of(UQ_BOOKINGS_REQUEST_TOKEN) => {
            let token = request_token.as_deref().unwrap_or_default();
            let existing = state
                .store
                .find_booking_by_request_token(auth.user_id, token)
                .await?
                .ok_or_else(|| AppError::Store(e))?;
            return Ok((StatusCode::OK, Json(DataResponse { data: existing })));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(
        booking_id = created.id,
        user_id = created.user_id,
        venue = %created.venue_name,
        status = %created.status,
        "Booking submitted"
    );

    state.event_bus.publish(
        PortalEvent::new(BOOKING_SUBMITTED)
            .with_source(ENTITY_BOOKING, created.id)
            .with_actor(auth.user_id)
            .with_payload(json!({
                KEY_BOOKING_ID: created.id,
                KEY_OWNER_ID: created.user_id,
                KEY_VENUE_NAME: created.venue_name,
                KEY_PURPOSE: created.purpose,
                KEY_HIGH_PRIORITY: created.status == BookingStatus::HighPriority,
            })),
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

/// GET /api/v1/bookings
///
/// List bookings, most recent first. Admins see everything; students and
/// faculty only ever see their own.
pub async fn list_bookings(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<BookingListParams>,
) -> AppResult<Json<DataResponse<Vec<Booking>>>> {
    let user_id = match (auth.is_admin(), params.user_id) {
        (true, requested) => requested,
        (false, Some(requested)) if requested != auth.user_id => {
            return Err(CoreError::Forbidden("You may only list your own bookings".into()).into());
        }
        (false, _) => Some(auth.user_id),
    };

    let filter = BookingFilter {
        user_id,
        status: parse_optional::<BookingStatus>(params.status.as_deref())?,
        category: parse_optional::<BookingCategory>(params.category.as_deref())?,
        target: None,
        open_only: params.open_only,
        limit: params.limit,
        offset: params.offset,
    };

    let bookings = state.store.list_bookings(&filter).await?;
    Ok(Json(DataResponse { data: bookings }))
}

/// GET /api/v1/bookings/{id}
///
/// Owners and admins only.
pub async fn get_booking(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Booking>>> {
    let booking = find_booking(&state, id).await?;
    if !auth.is_admin() && booking.user_id != auth.user_id {
        return Err(CoreError::Forbidden("You may only view your own bookings".into()).into());
    }
    Ok(Json(DataResponse { data: booking }))
}

/// POST /api/v1/bookings/{id}/approve
pub async fn approve_booking(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<DecisionRequest>,
) -> AppResult<Json<DataResponse<Booking>>> {
    let booking = apply_decision(&state, admin, id, Decision::Approve, &input.comment).await?;
    Ok(Json(DataResponse { data: booking }))
}

/// POST /api/v1/bookings/{id}/reject
pub async fn reject_booking(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<DecisionRequest>,
) -> AppResult<Json<DataResponse<Booking>>> {
    let booking = apply_decision(&state, admin, id, Decision::Reject, &input.comment).await?;
    Ok(Json(DataResponse { data: booking }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn resolve_target(venue_id: Option<DbId>, package_id: Option<DbId>) -> AppResult<BookingTarget> {
    match (venue_id, package_id) {
        (Some(id), None) => catalog::find_venue(id)
            .map(BookingTarget::Venue)
            .ok_or(AppError::Core(CoreError::NotFound { entity: "Venue", id })),
        (None, Some(id)) => catalog::find_package(id)
            .map(BookingTarget::Package)
            .ok_or(AppError::Core(CoreError::NotFound {
                entity: "EventPackage",
                id,
            })),
        _ => Err(CoreError::Validation(
            "exactly one of venue_id or package_id is required".into(),
        )
        .into()),
    }
}

async fn find_booking(state: &AppState, id: DbId) -> AppResult<Booking> {
    state
        .store
        .find_booking(id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Booking",
            id,
        }))
}

/// Slots held by approved bookings of one target, optionally ignoring one booking.
pub(crate) async fn held_slots(
    store: &dyn Store,
    kind: TargetKind,
    target_id: DbId,
    exclude: Option<DbId>,
) -> AppResult<Vec<SlotRef>> {
    let mut held = Vec::new();
    let mut offset = 0;
    loop {
        let page = store
            .list_bookings(&BookingFilter {
                status: Some(BookingStatus::Approved),
                target: Some((kind, target_id)),
                limit: Some(MAX_LIMIT),
                offset: Some(offset),
                ..Default::default()
            })
            .await?;
        let fetched = page.len() as i64;
        held.extend(
            page.iter()
                .filter(|b| Some(b.id) != exclude)
                .flat_map(Booking::slot_refs),
        );
        if fetched < MAX_LIMIT {
            return Ok(held);
        }
        offset += fetched;
    }
}

/// Write `update` if `current` is still the stored version of the booking.
///
/// A lost race against a decision that already closed the booking is an
/// `InvalidTransition`; any other version mismatch is a `Conflict`.
async fn commit_decision(
    store: &dyn Store,
    current: &Booking,
    update: &BookingDecision,
) -> AppResult<Booking> {
    if let Some(updated) = store
        .update_booking_decision(current.id, current.version, update)
        .await?
    {
        return Ok(updated);
    }

    let latest = store
        .find_booking(current.id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Booking",
            id: current.id,
        }))?;
    if latest.status.is_terminal() {
        return Err(CoreError::InvalidTransition {
            from: latest.status.to_string(),
            to: update.status.to_string(),
        }
        .into());
    }
    Err(CoreError::Conflict("Booking was modified concurrently, retry".into()).into())
}

/// Run an admin decision through the state machine and persist it.
async fn apply_decision(
    state: &AppState,
    admin: AuthUser,
    id: DbId,
    decision: Decision,
    comment: &str,
) -> AppResult<Booking> {
    // Held across the clash check and the write, so two clashing approvals
    // cannot both pass the check.
    let _decision_guard = state.decision_lock.lock().await;

    let current = find_booking(state, id).await?;
    let next = booking::decide(admin.role, current.status, decision, comment)?;

    if decision == Decision::Approve {
        let held = held_slots(
            state.store.as_ref(),
            current.target_kind,
            current.venue_id,
            Some(current.id),
        )
        .await?;
        if any_clash(&current.slot_refs(), &held) {
            return Err(CoreError::Conflict(format!(
                "{} is already booked for one or more of the requested slots",
                current.venue_name
            ))
            .into());
        }
    }

    let comment = comment.trim().to_string();
    let update = BookingDecision {
        status: next,
        admin_feedback: AdminFeedback {
            admin_id: admin.user_id,
            comment: comment.clone(),
            date: Utc::now(),
        },
    };

    let updated = commit_decision(state.store.as_ref(), &current, &update).await?;

    tracing::info!(
        booking_id = updated.id,
        admin_id = admin.user_id,
        status = %updated.status,
        "Booking decided"
    );

    let event_type = match decision {
        Decision::Approve => BOOKING_APPROVED,
        Decision::Reject => BOOKING_REJECTED,
    };
    state.event_bus.publish(
        PortalEvent::new(event_type)
            .with_source(ENTITY_BOOKING, updated.id)
            .with_actor(admin.user_id)
            .with_payload(json!({
                KEY_BOOKING_ID: updated.id,
                KEY_OWNER_ID: updated.user_id,
                KEY_VENUE_NAME: updated.venue_name,
                KEY_COMMENT: comment,
            })),
    );

    Ok(updated)
}
