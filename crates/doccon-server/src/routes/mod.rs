//! HTTP routes. Everything lives under `/api`.

use axum::Router;

use crate::state::AppState;

mod admin;
mod auth;
mod certificates;
mod doctors;
mod enrollments;
mod health;
mod hospitals;

/// Build the application router.
pub fn app_router(state: AppState) -> Router {
    let api = Router::new()
        .merge(health::router())
        .nest("/auth", auth::router())
        .nest("/doctors", doctors::router())
        .nest("/hospitals", hospitals::router())
        .nest("/enrollments", enrollments::router())
        .nest("/admin", admin::router())
        .nest("/certificates", certificates::router());

    Router::new().nest("/api", api).with_state(state)
}
