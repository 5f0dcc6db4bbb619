use axum::{Router, middleware, routing::get};

use greenlight_core::permissions::{MOVIES_READ, MOVIES_WRITE};

use crate::middleware::permission::{PermissionGate, require_permission};
use crate::modules::movies::controller::{
    create_movie, delete_movie, get_movie, list_movies, update_movie,
};
use crate::state::AppState;

/// Reads need `movies:read`, writes need `movies:write`. Each gate wraps only
/// the method handlers it guards.
pub fn init_movies_router(state: &AppState) -> Router<AppState> {
    let read = middleware::from_fn_with_state(
        PermissionGate::new(state.clone(), MOVIES_READ),
        require_permission,
    );
    let write = middleware::from_fn_with_state(
        PermissionGate::new(state.clone(), MOVIES_WRITE),
        require_permission,
    );

    Router::new()
        .route(
            "/",
            get(list_movies)
                .route_layer(read.clone())
                .merge(axum::routing::post(create_movie).route_layer(write.clone())),
        )
        .route(
            "/{id}",
            get(get_movie).route_layer(read).merge(
                axum::routing::patch(update_movie)
                    .delete(delete_movie)
                    .route_layer(write),
            ),
        )
}
