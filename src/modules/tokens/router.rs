use crate::modules::tokens::controller::{
    create_activation_token, create_authentication_token, create_password_reset_token,
};
use crate::state::AppState;
use axum::{Router, routing::post};

pub fn init_tokens_router() -> Router<AppState> {
    Router::new()
        .route("/authentication", post(create_authentication_token))
        .route("/activation", post(create_activation_token))
        .route("/password-reset", post(create_password_reset_token))
}
