//! # Greenlight Models
//!
//! Domain models and DTOs for the Greenlight API.
//!
//! # Modules
//!
//! - [`identity`]: the per-request caller identity (anonymous or a user)
//! - [`movies`]: movie records, request DTOs and list filters
//! - [`permissions`]: a user's set of permission codes
//! - [`tokens`]: token scopes and issued tokens
//! - [`users`]: user records and request DTOs
//!
//! # Example
//!
//! ```ignore
//! use greenlight_models::{Identity, TokenScope, User};
//!
//! match identity {
//!     Identity::Anonymous => println!("no credentials supplied"),
//!     Identity::User(user) => println!("request from {}", user.email),
//! }
//! ```

pub mod identity;
pub mod movies;
pub mod permissions;
pub mod tokens;
pub mod users;

// Re-export commonly used types at crate root for convenience
pub use identity::Identity;
pub use movies::{CreateMovieDto, Metadata, Movie, MovieFilters, Runtime, UpdateMovieDto};
pub use permissions::Permissions;
pub use tokens::{TOKEN_PLAINTEXT_LEN, Token, TokenScope};
pub use users::{
    ActivateUserDto, CreateAuthenticationTokenDto, EmailDto, RegisterUserDto, ResetPasswordDto,
    User,
};
