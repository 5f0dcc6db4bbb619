//! Authorization gates.
//!
//! Each gate implies the previous one, so the first failing check decides
//! the rejection: an anonymous caller is `authentication_required`, an
//! unactivated one is `inactive_account`, and only an activated user missing
//! the code is `not_permitted`. A rejected request never reaches the handler.

use anyhow::anyhow;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use greenlight_core::AppError;
use greenlight_db::with_deadline;
use greenlight_models::{Identity, User};

use crate::state::AppState;

/// The user bound by the authenticate layer, or `Unauthenticated`.
pub fn authenticated_user(identity: Option<&Identity>) -> Result<&User, AppError> {
    match identity {
        Some(Identity::User(user)) => Ok(user),
        Some(Identity::Anonymous) => Err(AppError::unauthenticated()),
        None => Err(AppError::internal(anyhow!(
            "identity missing from request, is the authenticate layer installed?"
        ))),
    }
}

/// [`authenticated_user`], additionally requiring an activated account.
pub fn activated_user(identity: Option<&Identity>) -> Result<&User, AppError> {
    let user = authenticated_user(identity)?;
    if !user.activated {
        return Err(AppError::not_activated());
    }
    Ok(user)
}

pub async fn require_authenticated_user(req: Request, next: Next) -> Result<Response, AppError> {
    authenticated_user(req.extensions().get::<Identity>())?;
    Ok(next.run(req).await)
}

pub async fn require_activated_user(req: Request, next: Next) -> Result<Response, AppError> {
    activated_user(req.extensions().get::<Identity>())?;
    Ok(next.run(req).await)
}

/// State for [`require_permission`]: the permission code a route needs.
#[derive(Clone)]
pub struct PermissionGate {
    state: AppState,
    code: &'static str,
}

impl PermissionGate {
    pub fn new(state: AppState, code: &'static str) -> Self {
        Self { state, code }
    }
}

/// Requires an activated user holding the gate's permission code. The
/// permission lookup is bounded by the query deadline.
pub async fn require_permission(
    State(gate): State<PermissionGate>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = activated_user(req.extensions().get::<Identity>())?.id;

    let permissions =
        with_deadline(gate.state.models.permissions.get_all_for_user(user_id)).await?;

    if !permissions.includes(gate.code) {
        warn!(user_id, permission = gate.code, "permission denied");
        return Err(AppError::forbidden());
    }

    Ok(next.run(req).await)
}
