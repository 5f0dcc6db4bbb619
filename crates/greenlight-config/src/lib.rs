//! # Greenlight Config
//!
//! Configuration types for the Greenlight API.
//!
//! Settings are read from command-line flags, each with an environment
//! variable fallback (load `.env` with `dotenvy` before parsing):
//!
//! - [`app`]: top-level [`AppConfig`] and the [`Environment`] name
//! - [`database`]: PostgreSQL DSN and pool limits
//! - [`rate_limit`]: per-client request budget and idle-client sweeping
//! - [`tokens`]: time-to-live for each token scope
//! - [`email`]: SMTP settings for outbound mail
//! - [`cors`]: trusted cross-origin callers
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use greenlight_config::AppConfig;
//!
//! dotenvy::dotenv().ok();
//! let config = AppConfig::parse();
//! println!("listening on {}", config.port);
//! ```

pub mod app;
pub mod cors;
pub mod database;
pub mod duration;
pub mod email;
pub mod rate_limit;
pub mod tokens;

// Re-export commonly used types at crate root
pub use app::{AppConfig, Environment};
pub use cors::CorsConfig;
pub use database::DatabaseConfig;
pub use email::EmailConfig;
pub use rate_limit::RateLimitConfig;
pub use tokens::TokenConfig;
