//! Request extractors with JSON error responses.

use axum::extract::{FromRequest, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use doccon_core::models::doctor::Doctor;
use doccon_core::repository::Pagination;
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

/// The doctor behind the request's bearer token.
pub struct AuthDoctor(pub Doctor);

impl FromRequestParts<AppState> for AuthDoctor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        let doctor = state.auth.authenticate(header).await?;
        Ok(Self(doctor))
    }
}

/// `axum::Json` whose rejection is a validation error.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Query` whose rejection is a validation error.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// `axum::extract::Path` whose rejection is a validation error.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// `page` / `limit` query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl PageParams {
    pub fn pagination(&self, default_limit: u64) -> Pagination {
        Pagination::page(self.page.unwrap_or(1), self.limit.unwrap_or(default_limit))
    }
}
