//! Handler for the role-specific dashboard summary.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use venuebook_core::booking::BookingCategory;
use venuebook_core::roles::Role;
use venuebook_db::models::booking::{Booking, BookingFilter, StatusCounts};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Number of bookings listed in the "recent" widget.
const RECENT_LIMIT: i64 = 5;

/// Open bookings split by category (admin view only).
#[derive(Debug, Serialize)]
pub struct OpenByCategory {
    pub lecture: i64,
    pub event: i64,
}

#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub role: Role,
    pub counts: StatusCounts,
    pub total: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_by_category: Option<OpenByCategory>,
    /// Admins: most recent open requests. Others: their most recent bookings.
    pub recent: Vec<Booking>,
}

/// GET /api/v1/dashboard
pub async fn get_dashboard(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<DashboardSummary>>> {
    let summary = if auth.is_admin() {
        let counts = state.store.booking_status_counts(None).await?;
        let open_by_category = OpenByCategory {
            lecture: state.store.open_booking_count(BookingCategory::Lecture).await?,
            event: state.store.open_booking_count(BookingCategory::Event).await?,
        };
        let recent = state
            .store
            .list_bookings(&BookingFilter {
                open_only: true,
                limit: Some(RECENT_LIMIT),
                ..Default::default()
            })
            .await?;
        DashboardSummary {
            role: auth.role,
            total: counts.total(),
            counts,
            open_by_category: Some(open_by_category),
            recent,
        }
    } else {
        let counts = state.store.booking_status_counts(Some(auth.user_id)).await?;
        let recent = state
            .store
            .list_bookings(&BookingFilter {
                user_id: Some(auth.user_id),
                limit: Some(RECENT_LIMIT),
                ..Default::default()
            })
            .await?;
        DashboardSummary {
            role: auth.role,
            total: counts.total(),
            counts,
            open_by_category: None,
            recent,
        }
    };

    Ok(Json(DataResponse { data: summary }))
}
