use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use doccon_auth::require_admin;
use doccon_core::models::doctor::{Doctor, DoctorFilter, DoctorPublic};
use doccon_core::models::specialty::Specialty;
use doccon_core::repository::{DoctorRepository, Page, Pagination};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::extract::{ApiPath, ApiQuery, AuthDoctor, PageParams};
use crate::state::AppState;

const DIRECTORY_LIMIT: u64 = 10;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/stats/overview", get(overview))
        .route("/stats/doctors", get(stats))
        .route("/specializations/all", get(specializations))
        .route("/search/{query}", get(search))
        .route("/specialization/{specialization}", get(by_specialization))
        .route("/location/{city}", get(by_location))
        .route("/{id}", get(get_one))
}

/// Profile summary of the calling doctor.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileStats {
    name: String,
    specialization: Specialty,
    experience_years: u32,
    city: String,
    state: String,
    is_verified: bool,
    member_since: DateTime<Utc>,
}

/// `?limit=` for directory lookups.
#[derive(Debug, Default, Deserialize)]
struct LimitParams {
    limit: Option<u64>,
}

impl LimitParams {
    fn limit(&self) -> u64 {
        Pagination::page(1, self.limit.unwrap_or(DIRECTORY_LIMIT)).limit
    }
}

fn public(doctors: &[Doctor]) -> Vec<DoctorPublic> {
    doctors.iter().map(Doctor::public).collect()
}

async fn list(
    State(state): State<AppState>,
    AuthDoctor(actor): AuthDoctor,
    ApiQuery(filter): ApiQuery<DoctorFilter>,
    ApiQuery(paging): ApiQuery<PageParams>,
) -> ApiResult<Json<Page<Doctor>>> {
    require_admin(&actor)?;
    let mut page = state
        .doctors
        .list(filter, paging.pagination(20))
        .await?;
    let items: Vec<Doctor> = std::mem::take(&mut page.items)
        .into_iter()
        .map(Doctor::without_credentials)
        .collect();
    Ok(Json(page.map_items(items).into_page()))
}

async fn overview(AuthDoctor(doctor): AuthDoctor) -> Json<Value> {
    let stats = ProfileStats {
        name: doctor.name,
        specialization: doctor.specialization,
        experience_years: doctor.experience_years,
        city: doctor.city,
        state: doctor.state,
        is_verified: doctor.is_verified,
        member_since: doctor.created_at,
    };
    Json(json!({ "stats": stats }))
}

async fn stats(
    State(state): State<AppState>,
    AuthDoctor(actor): AuthDoctor,
) -> ApiResult<Json<Value>> {
    require_admin(&actor)?;
    let stats = state.doctors.stats().await?;
    Ok(Json(json!({ "stats": stats })))
}

async fn get_one(
    State(state): State<AppState>,
    AuthDoctor(_): AuthDoctor,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Value>> {
    let doctor = state.doctors.get_by_id(id).await?;
    Ok(Json(json!({ "doctor": doctor.public() })))
}

async fn search(
    State(state): State<AppState>,
    AuthDoctor(_): AuthDoctor,
    ApiPath(query): ApiPath<String>,
    ApiQuery(params): ApiQuery<LimitParams>,
) -> ApiResult<Json<Value>> {
    let doctors = state.doctors.search(&query, params.limit()).await?;
    Ok(Json(json!({ "doctors": public(&doctors) })))
}

async fn by_specialization(
    State(state): State<AppState>,
    AuthDoctor(_): AuthDoctor,
    ApiPath(specialization): ApiPath<Specialty>,
    ApiQuery(params): ApiQuery<LimitParams>,
) -> ApiResult<Json<Value>> {
    let filter = DoctorFilter {
        specialization: Some(specialization),
        ..Default::default()
    };
    let page = state
        .doctors
        .list(filter, Pagination::page(1, params.limit()))
        .await?;
    Ok(Json(json!({ "doctors": public(&page.items) })))
}

async fn by_location(
    State(state): State<AppState>,
    AuthDoctor(_): AuthDoctor,
    ApiPath(city): ApiPath<String>,
    ApiQuery(params): ApiQuery<LimitParams>,
) -> ApiResult<Json<Value>> {
    let filter = DoctorFilter {
        city: Some(city),
        ..Default::default()
    };
    let page = state
        .doctors
        .list(filter, Pagination::page(1, params.limit()))
        .await?;
    Ok(Json(json!({ "doctors": public(&page.items) })))
}

async fn specializations(
    State(state): State<AppState>,
    AuthDoctor(_): AuthDoctor,
) -> ApiResult<Json<Value>> {
    let specializations = state.doctors.specializations().await?;
    Ok(Json(json!({ "specializations": specializations })))
}
