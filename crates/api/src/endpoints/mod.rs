//! API endpoints.

mod auth;
mod complaints;
mod departments;
mod notifications;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/complaints", complaints::citizen_router())
        .nest("/admin/complaints", complaints::admin_router())
        .nest("/departments", departments::router())
        .nest("/admin/departments", departments::admin_router())
        .nest("/notifications", notifications::router())
}
