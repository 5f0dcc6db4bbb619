use anyhow::anyhow;
use axum::extract::State;
use axum::http::{HeaderValue, Method, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Router, middleware};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

use greenlight_config::CorsConfig;
use greenlight_core::AppError;
use greenlight_observability::{logging_middleware, metrics_middleware};

use crate::middleware::auth::authenticate;
use crate::middleware::rate_limit::rate_limit;
use crate::middleware::recover::recover_panic_layer;
use crate::modules::healthcheck::router::init_healthcheck_router;
use crate::modules::movies::router::init_movies_router;
use crate::modules::tokens::router::init_tokens_router;
use crate::modules::users::router::init_users_router;
use crate::state::AppState;

/// Builds the full application.
///
/// Layers, outermost first: panic recovery, metrics, request logging, CORS,
/// rate limiting, authentication. Permission gates sit on the individual
/// method handlers.
pub fn init_router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/healthcheck", init_healthcheck_router())
        .nest("/movies", init_movies_router(&state))
        .nest("/users", init_users_router())
        .nest("/tokens", init_tokens_router());

    let mut app = Router::new()
        .nest("/v1", api)
        .route("/debug/vars", get(debug_vars))
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(state.clone(), authenticate))
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit));

    if let Some(cors) = cors_layer(&state.config.cors) {
        app = app.layer(cors);
    }

    app.layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(recover_panic_layer())
}

/// Trusted origins get CORS headers, including preflight answers; everyone
/// else gets none.
fn cors_layer(config: &CorsConfig) -> Option<CorsLayer> {
    if !config.is_enabled() {
        return None;
    }

    let origins: Vec<HeaderValue> = config
        .trusted_origins
        .iter()
        .map(|origin| origin.trim())
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin, "ignoring invalid trusted origin");
                None
            }
        })
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
    )
}

/// `GET /debug/vars`: Prometheus text exposition.
async fn debug_vars(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => AppError::not_found(anyhow!("metrics are not enabled")).into_response(),
    }
}

async fn not_found() -> AppError {
    AppError::not_found(anyhow!("the requested resource could not be found"))
}

async fn method_not_allowed() -> AppError {
    AppError::method_not_allowed()
}
