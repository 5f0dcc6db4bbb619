use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};
use tracing::instrument;

use greenlight_core::AppError;
use greenlight_models::{ActivateUserDto, RegisterUserDto, ResetPasswordDto};

use super::service::UserService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// `POST /v1/users`
#[instrument(skip(state, dto))]
pub async fn register_user(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RegisterUserDto>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let user = UserService::register_user(&state, dto).await?;
    Ok((StatusCode::ACCEPTED, Json(json!({ "user": user }))))
}

/// `PUT /v1/users/activated`
#[instrument(skip(state, dto))]
pub async fn activate_user(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<ActivateUserDto>,
) -> Result<Json<Value>, AppError> {
    let user = UserService::activate_user(&state, dto).await?;
    Ok(Json(json!({ "user": user })))
}

/// `PUT /v1/users/password`
#[instrument(skip(state, dto))]
pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<ResetPasswordDto>,
) -> Result<Json<Value>, AppError> {
    UserService::reset_password(&state, dto).await?;
    Ok(Json(json!({ "message": "your password was successfully reset" })))
}
