//! Handlers for the read-only venue and event package catalog.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use venuebook_core::booking::TargetKind;
use venuebook_core::catalog::{self, EventPackage, Venue};
use venuebook_core::error::CoreError;
use venuebook_core::time_slot::{slot_window, TimeSlot};
use venuebook_core::types::DbId;

use crate::error::{AppError, AppResult};
use crate::handlers::booking::held_slots;
use crate::middleware::rbac::RequireAuth;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /venues/{id}/slots`.
#[derive(Debug, Deserialize)]
pub struct SlotWindowParams {
    /// First day of the window, `YYYY-MM-DD`. Defaults to today (UTC).
    pub from: Option<String>,
}

/// A package with its venues resolved.
#[derive(Debug, Serialize)]
pub struct PackageDetail {
    #[serde(flatten)]
    pub package: &'static EventPackage,
    pub venues: Vec<&'static Venue>,
}

/// GET /api/v1/venues
pub async fn list_venues(_auth: RequireAuth) -> Json<DataResponse<&'static [Venue]>> {
    Json(DataResponse {
        data: catalog::venues(),
    })
}

/// GET /api/v1/venues/{id}
pub async fn get_venue(
    _auth: RequireAuth,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<&'static Venue>>> {
    Ok(Json(DataResponse {
        data: find_venue(id)?,
    }))
}

/// GET /api/v1/venues/{id}/slots?from=YYYY-MM-DD
///
/// The 7-day hourly grid for a venue. Slots held by approved bookings are
/// marked unavailable.
pub async fn venue_slots(
    _auth: RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<SlotWindowParams>,
) -> AppResult<Json<DataResponse<Vec<TimeSlot>>>> {
    let venue = find_venue(id)?;
    let start = match params.from.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
            AppError::Core(CoreError::Validation(format!(
                "from must be a date in YYYY-MM-DD format, got '{raw}'"
            )))
        })?,
        None => Utc::now().date_naive(),
    };

    let held = held_slots(state.store.as_ref(), TargetKind::Venue, venue.id, None).await?;
    Ok(Json(DataResponse {
        data: slot_window(start, &held)?,
    }))
}

/// GET /api/v1/packages
pub async fn list_packages(_auth: RequireAuth) -> Json<DataResponse<Vec<PackageDetail>>> {
    let data = catalog::packages().iter().map(package_detail).collect();
    Json(DataResponse { data })
}

/// GET /api/v1/packages/{id}
pub async fn get_package(
    _auth: RequireAuth,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PackageDetail>>> {
    let package = catalog::find_package(id).ok_or(AppError::Core(CoreError::NotFound {
        entity: "EventPackage",
        id,
    }))?;
    Ok(Json(DataResponse {
        data: package_detail(package),
    }))
}

fn find_venue(id: DbId) -> AppResult<&'static Venue> {
    catalog::find_venue(id).ok_or(AppError::Core(CoreError::NotFound { entity: "Venue", id }))
}

fn package_detail(package: &'static EventPackage) -> PackageDetail {
    PackageDetail {
        package,
        venues: catalog::package_venues(package),
    }
}
