pub mod auth;
pub mod booking;
pub mod catalog;
pub mod health;
pub mod notification;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/signup                       signup (public)
/// /auth/login                        login (public)
/// /auth/refresh                      refresh (public)
/// /auth/logout                       logout (requires auth)
/// /auth/me                           current user (requires auth)
///
/// /venues                            list
/// /venues/{id}                       get
/// /venues/{id}/slots                 7-day availability grid
/// /packages                          list
/// /packages/{id}                     get
///
/// /bookings                          submit (student/faculty), list
/// /bookings/{id}                     get (owner or admin)
/// /bookings/{id}/approve             approve (admin)
/// /bookings/{id}/reject              reject (admin)
///
/// /dashboard                         role-specific summary
///
/// /notifications                     list
/// /notifications/unread-count        unread count
/// /notifications/read-all            mark all read
/// /notifications/{id}/read           mark one read
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .merge(catalog::router())
        .nest("/bookings", booking::router())
        .route("/dashboard", get(handlers::dashboard::get_dashboard))
        .nest("/notifications", notification::router())
}
