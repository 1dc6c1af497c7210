//! Route definitions for the `/bookings` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::booking;
use crate::state::AppState;

/// Routes mounted at `/bookings`.
///
/// ```text
/// GET    /                -> list_bookings
/// POST   /                -> submit_booking
/// GET    /{id}            -> get_booking
/// POST   /{id}/approve    -> approve_booking
/// POST   /{id}/reject     -> reject_booking
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(booking::list_bookings).post(booking::submit_booking),
        )
        .route("/{id}", get(booking::get_booking))
        .route("/{id}/approve", post(booking::approve_booking))
        .route("/{id}/reject", post(booking::reject_booking))
}
