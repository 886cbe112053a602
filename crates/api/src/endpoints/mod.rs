//! API endpoints.

mod admin;
mod auth;
mod devices;
mod issue_requests;
mod users;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .nest("/users", users::router())
        .nest("/devices", devices::router())
        .nest("/issue-requests", issue_requests::router())
        .nest("/admin", admin::router())
}
