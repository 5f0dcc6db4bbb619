use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};
use tracing::instrument;

use greenlight_core::AppError;
use greenlight_models::{CreateAuthenticationTokenDto, EmailDto};

use super::service::TokenService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// `POST /v1/tokens/authentication`
#[instrument(skip(state, dto))]
pub async fn create_authentication_token(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateAuthenticationTokenDto>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let token = TokenService::create_authentication_token(&state, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "authentication_token": token })),
    ))
}

/// `POST /v1/tokens/activation`
#[instrument(skip(state, dto))]
pub async fn create_activation_token(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<EmailDto>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    TokenService::create_activation_token(&state, dto).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "message": "an email will be sent to you containing activation instructions" })),
    ))
}

/// `POST /v1/tokens/password-reset`
#[instrument(skip(state, dto))]
pub async fn create_password_reset_token(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<EmailDto>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    TokenService::create_password_reset_token(&state, dto).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "message": "an email will be sent to you containing password reset instructions" })),
    ))
}
