//! The calling doctor's enrollments.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use doccon_core::models::enrollment::{CreateEnrollmentRequest, EnrollmentStatus, EnrollmentView};
use doccon_core::repository::Page;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery, AuthDoctor, PageParams};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/stats/overview", get(stats))
        .route("/active/current", get(active))
        .route("/{id}", get(get_one).put(update).delete(cancel))
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StatusFilter {
    pub status: Option<EnrollmentStatus>,
}

#[derive(Debug, Deserialize)]
struct UpdateEnrollment {
    notes: Option<String>,
}

async fn create(
    State(state): State<AppState>,
    AuthDoctor(doctor): AuthDoctor,
    ApiJson(input): ApiJson<CreateEnrollmentRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let enrollment = state.enrollments.create(&doctor, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Enrollment request submitted successfully",
            "enrollment": enrollment,
        })),
    ))
}

async fn list(
    State(state): State<AppState>,
    AuthDoctor(doctor): AuthDoctor,
    ApiQuery(filter): ApiQuery<StatusFilter>,
    ApiQuery(paging): ApiQuery<PageParams>,
) -> ApiResult<Json<Page<EnrollmentView>>> {
    let page = state
        .enrollments
        .list_for_doctor(&doctor, filter.status, paging.pagination(10))
        .await?;
    Ok(Json(page.into_page()))
}

async fn get_one(
    State(state): State<AppState>,
    AuthDoctor(doctor): AuthDoctor,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Value>> {
    let enrollment = state.enrollments.get_for_doctor(&doctor, id).await?;
    Ok(Json(json!({ "enrollment": enrollment })))
}

async fn update(
    State(state): State<AppState>,
    AuthDoctor(doctor): AuthDoctor,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<UpdateEnrollment>,
) -> ApiResult<Json<Value>> {
    let enrollment = state
        .enrollments
        .update_notes(&doctor, id, input.notes)
        .await?;
    Ok(Json(json!({
        "message": "Enrollment updated successfully",
        "enrollment": enrollment,
    })))
}

async fn cancel(
    State(state): State<AppState>,
    AuthDoctor(doctor): AuthDoctor,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Value>> {
    let enrollment = state.enrollments.cancel(&doctor, id).await?;
    Ok(Json(json!({
        "message": "Enrollment cancelled successfully",
        "enrollment": enrollment,
    })))
}

async fn stats(
    State(state): State<AppState>,
    AuthDoctor(doctor): AuthDoctor,
) -> ApiResult<Json<Value>> {
    let stats = state.enrollments.stats_for_doctor(&doctor).await?;
    Ok(Json(json!({ "stats": stats })))
}

async fn active(
    State(state): State<AppState>,
    AuthDoctor(doctor): AuthDoctor,
) -> ApiResult<Json<Value>> {
    let enrollments = state.enrollments.active_for_doctor(&doctor).await?;
    Ok(Json(json!({ "enrollments": enrollments })))
}
