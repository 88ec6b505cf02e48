//! Registration, login and the caller's own profile.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use doccon_auth::AuthOutput;
use doccon_core::models::doctor::{RegisterDoctor, UpdateProfile};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::ApiResult;
use crate::extract::{ApiJson, AuthDoctor};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/profile", get(profile).put(update_profile))
        .route("/change-password", put(change_password))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct ChangePasswordRequest {
    #[serde(alias = "currentPassword")]
    current_password: String,
    #[serde(alias = "newPassword")]
    new_password: String,
}

fn session(message: &str, output: AuthOutput) -> Value {
    json!({
        "message": message,
        "token": output.token,
        "expires_in": output.expires_in,
        "doctor": output.doctor.without_credentials(),
    })
}

async fn register(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<RegisterDoctor>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let output = state.auth.register(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(session("Doctor registered successfully", output)),
    ))
}

async fn login(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<LoginRequest>,
) -> ApiResult<Json<Value>> {
    let output = state.auth.login(&input.email, &input.password).await?;
    Ok(Json(session("Login successful", output)))
}

async fn profile(AuthDoctor(doctor): AuthDoctor) -> Json<Value> {
    Json(json!({ "doctor": doctor }))
}

async fn update_profile(
    State(state): State<AppState>,
    AuthDoctor(doctor): AuthDoctor,
    ApiJson(input): ApiJson<UpdateProfile>,
) -> ApiResult<Json<Value>> {
    let doctor = state.auth.update_profile(&doctor, input).await?;
    Ok(Json(json!({
        "message": "Profile updated successfully",
        "doctor": doctor,
    })))
}

async fn change_password(
    State(state): State<AppState>,
    AuthDoctor(doctor): AuthDoctor,
    ApiJson(input): ApiJson<ChangePasswordRequest>,
) -> ApiResult<Json<Value>> {
    state
        .auth
        .change_password(&doctor, &input.current_password, &input.new_password)
        .await?;
    Ok(Json(json!({ "message": "Password changed successfully" })))
}
