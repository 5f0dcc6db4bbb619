//! Permission codes for the Greenlight API.
//!
//! Use these constants instead of string literals when wiring permission
//! gates or granting permissions to users.
//!
//! ```ignore
//! use greenlight_core::permissions;
//!
//! if user_permissions.includes(permissions::MOVIES_WRITE) {
//!     // ...
//! }
//! ```

/// Permission to list and show movies
pub const MOVIES_READ: &str = "movies:read";
/// Permission to create, update and delete movies
pub const MOVIES_WRITE: &str = "movies:write";

/// Permissions granted to every newly registered user.
pub const DEFAULT_GRANTS: &[&str] = &[MOVIES_READ];
