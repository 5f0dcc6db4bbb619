use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::state::AppState;

/// `GET /v1/healthcheck`
pub async fn healthcheck(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "available",
        "system_info": {
            "environment": state.config.environment.as_str(),
            "version": env!("CARGO_PKG_VERSION"),
        }
    }))
}
