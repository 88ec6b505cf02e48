//! The calling doctor's certificates.

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use doccon_core::models::certificate::Certificate;
use doccon_core::repository::Page;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::extract::{ApiPath, ApiQuery, AuthDoctor, PageParams};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/stats/overview", get(stats))
        .route("/generate/{enrollment_id}", post(generate))
        .route("/{id}", get(get_one))
        .route("/{id}/download", get(download))
}

async fn list(
    State(state): State<AppState>,
    AuthDoctor(doctor): AuthDoctor,
    ApiQuery(paging): ApiQuery<PageParams>,
) -> ApiResult<Json<Page<Certificate>>> {
    let page = state
        .certificates
        .list_for_doctor(&doctor, paging.pagination(10))
        .await?;
    Ok(Json(page.into_page()))
}

async fn get_one(
    State(state): State<AppState>,
    AuthDoctor(doctor): AuthDoctor,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Value>> {
    let certificate = state.certificates.get_for_doctor(&doctor, id).await?;
    Ok(Json(json!({ "certificate": certificate })))
}

async fn download(
    State(state): State<AppState>,
    AuthDoctor(doctor): AuthDoctor,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let file = state.certificates.download(&doctor, id).await?;
    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file.file_name),
        ),
    ];
    Ok((StatusCode::OK, headers, file.bytes))
}

async fn generate(
    State(state): State<AppState>,
    AuthDoctor(doctor): AuthDoctor,
    ApiPath(enrollment_id): ApiPath<Uuid>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let certificate = state.certificates.generate(&doctor, enrollment_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Certificate generated successfully",
            "certificate": certificate,
        })),
    ))
}

async fn stats(
    State(state): State<AppState>,
    AuthDoctor(doctor): AuthDoctor,
) -> ApiResult<Json<Value>> {
    let stats = state.certificates.stats_for_doctor(&doctor).await?;
    Ok(Json(json!({ "stats": stats })))
}
