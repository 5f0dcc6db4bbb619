use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use greenlight_core::AppError;
use greenlight_db::StoreError;
use greenlight_models::{Identity, TokenScope};

use crate::modules::tokens::service::TokenService;
use crate::state::AppState;

/// Splits `Bearer <token>`. Anything other than exactly two space-separated
/// parts with the `Bearer` scheme is rejected.
pub(crate) fn bearer_token(value: &str) -> Option<&str> {
    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Some(token),
        _ => None,
    }
}

async fn resolve_identity(state: &AppState, headers: &HeaderMap) -> Result<Identity, AppError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(Identity::Anonymous);
    };

    let token = value
        .to_str()
        .ok()
        .and_then(bearer_token)
        .ok_or_else(AppError::malformed_credential)?;

    match TokenService::get_for_token(&state.models, TokenScope::Authentication, token).await {
        Ok(user) => Ok(Identity::User(user)),
        Err(StoreError::RecordNotFound) => Err(AppError::invalid_token()),
        Err(err) => Err(err.into()),
    }
}

/// Binds the caller's [`Identity`] to the request.
///
/// A missing header makes the caller anonymous; a malformed header or an
/// unknown token ends the request. Every response carries
/// `Vary: Authorization`.
pub async fn authenticate(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let mut response = match resolve_identity(&state, req.headers()).await {
        Ok(identity) => {
            if let Some(user) = identity.user() {
                debug!(user_id = user.id, "request authenticated");
            }
            req.extensions_mut().insert(identity);
            next.run(req).await
        }
        Err(err) => err.into_response(),
    };

    response
        .headers_mut()
        .append(header::VARY, HeaderValue::from_static("Authorization"));
    response
}
