use crate::modules::users::controller::{activate_user, register_user, reset_password};
use crate::state::AppState;
use axum::{
    Router,
    routing::{post, put},
};

pub fn init_users_router() -> Router<AppState> {
    Router::new()
        .route("/", post(register_user))
        .route("/activated", put(activate_user))
        .route("/password", put(reset_password))
}
