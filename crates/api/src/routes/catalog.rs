//! Route definitions for the venue and package catalog.

use axum::routing::get;
use axum::Router;

use crate::handlers::catalog;
use crate::state::AppState;

/// Catalog routes, merged at the `/api/v1` root.
///
/// ```text
/// GET /venues               -> list_venues
/// GET /venues/{id}          -> get_venue
/// GET /venues/{id}/slots    -> venue_slots
/// GET /packages             -> list_packages
/// GET /packages/{id}        -> get_package
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/venues", get(catalog::list_venues))
        .route("/venues/{id}", get(catalog::get_venue))
        .route("/venues/{id}/slots", get(catalog::venue_slots))
        .route("/packages", get(catalog::list_packages))
        .route("/packages/{id}", get(catalog::get_package))
}
