//! Public hospital catalogue.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use doccon_core::models::hospital::{Hospital, HospitalFilter};
use doccon_core::repository::{HospitalRepository, Page};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::extract::{ApiPath, ApiQuery, PageParams};
use crate::state::AppState;

const SEARCH_LIMIT: u64 = 20;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/{id}", get(get_one))
        .route("/search/{query}", get(search))
        .route("/specializations/all", get(specializations))
        .route("/stats/overview", get(stats))
}

async fn list(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<HospitalFilter>,
    ApiQuery(paging): ApiQuery<PageParams>,
) -> ApiResult<Json<Page<Hospital>>> {
    let page = state
        .hospitals
        .list(filter, paging.pagination(20))
        .await?;
    Ok(Json(page.into_page()))
}

async fn get_one(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Value>> {
    let hospital = state.hospitals.get_by_id(id).await?;
    Ok(Json(json!({ "hospital": hospital })))
}

async fn search(
    State(state): State<AppState>,
    ApiPath(query): ApiPath<String>,
) -> ApiResult<Json<Value>> {
    let hospitals = state.hospitals.search(&query, SEARCH_LIMIT).await?;
    Ok(Json(json!({ "hospitals": hospitals })))
}

async fn specializations(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let specializations = state.hospitals.specializations().await?;
    Ok(Json(json!({ "specializations": specializations })))
}

async fn stats(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let stats = state.hospitals.stats().await?;
    Ok(Json(json!({ "stats": stats })))
}
