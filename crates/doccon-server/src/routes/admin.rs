//! Admin review of enrollments and certificate verification. Role checks
//! happen in the services.

use axum::extract::State;
use axum::routing::{get, put};
use axum::{Json, Router};
use doccon_core::models::enrollment::EnrollmentDetail;
use doccon_core::repository::Page;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use super::enrollments::StatusFilter;
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery, AuthDoctor, PageParams};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/enrollments", get(list))
        .route("/enrollments/pending", get(pending))
        .route("/enrollments/{id}/approve", put(approve))
        .route("/enrollments/{id}/reject", put(reject))
        .route("/enrollments/{id}/complete", put(complete))
        .route("/certificates/{id}/verify", put(verify))
}

#[derive(Debug, Deserialize)]
struct RejectRequest {
    #[serde(alias = "reason")]
    rejection_reason: String,
}

async fn pending(
    State(state): State<AppState>,
    AuthDoctor(actor): AuthDoctor,
    ApiQuery(paging): ApiQuery<PageParams>,
) -> ApiResult<Json<Page<EnrollmentDetail>>> {
    let page = state
        .enrollments
        .list_pending(&actor, paging.pagination(10))
        .await?;
    Ok(Json(page.into_page()))
}

async fn list(
    State(state): State<AppState>,
    AuthDoctor(actor): AuthDoctor,
    ApiQuery(filter): ApiQuery<StatusFilter>,
    ApiQuery(paging): ApiQuery<PageParams>,
) -> ApiResult<Json<Page<EnrollmentDetail>>> {
    let page = state
        .enrollments
        .list_all(&actor, filter.status, paging.pagination(10))
        .await?;
    Ok(Json(page.into_page()))
}

async fn approve(
    State(state): State<AppState>,
    AuthDoctor(actor): AuthDoctor,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Value>> {
    let outcome = state.enrollments.approve(&actor, id).await?;
    let body = match outcome.certificate_error {
        None => json!({
            "message": "Enrollment approved and certificate generated successfully",
            "enrollment": outcome.enrollment,
            "certificate": outcome.certificate,
        }),
        Some(error) => json!({
            "message": "Enrollment approved successfully, but certificate generation failed",
            "enrollment": outcome.enrollment,
            "certificateError": error,
        }),
    };
    Ok(Json(body))
}

async fn reject(
    State(state): State<AppState>,
    AuthDoctor(actor): AuthDoctor,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<RejectRequest>,
) -> ApiResult<Json<Value>> {
    let enrollment = state
        .enrollments
        .reject(&actor, id, &input.rejection_reason)
        .await?;
    Ok(Json(json!({
        "message": "Enrollment rejected successfully",
        "enrollment": enrollment,
    })))
}

async fn complete(
    State(state): State<AppState>,
    AuthDoctor(actor): AuthDoctor,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Value>> {
    let enrollment = state.enrollments.complete(&actor, id).await?;
    Ok(Json(json!({
        "message": "Enrollment marked as completed",
        "enrollment": enrollment,
    })))
}

async fn verify(
    State(state): State<AppState>,
    AuthDoctor(actor): AuthDoctor,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Value>> {
    let certificate = state.certificates.verify(&actor, id).await?;
    Ok(Json(json!({
        "message": "Certificate verified successfully",
        "certificate": certificate,
    })))
}
