//! Request pipeline stages.
//!
//! # Modules
//!
//! - [`rate_limit`]: per-client throttling in front of everything else
//! - [`auth`]: resolves the bearer token into an [`Identity`](greenlight_models::Identity)
//! - [`permission`]: authenticated, activated and permission gates
//! - [`recover`]: turns a handler panic into a 500 and closes the connection
//!
//! # Authentication Flow
//!
//! 1. Client sends `Authorization: Bearer <token>`, or nothing at all
//! 2. [`auth::authenticate`] stores the caller's identity in the request
//!    extensions, anonymous when there was no header
//! 3. Gates attached with `route_layer` read that identity and reject early
//! 4. Handler executes if all checks pass
//!
//! # Example
//!
//! ```ignore
//! use axum::{middleware, routing::get};
//! use crate::middleware::permission::{PermissionGate, require_permission};
//!
//! let gate = PermissionGate::new(state.clone(), "movies:read");
//! let route = get(list_movies)
//!     .route_layer(middleware::from_fn_with_state(gate, require_permission));
//! ```

pub mod auth;
pub mod permission;
pub mod rate_limit;
pub mod recover;
