//! # Greenlight Core
//!
//! Core types, errors, and utilities for the Greenlight API.
//!
//! This crate provides foundational types used throughout the application:
//!
//! - [`errors`]: Application error type with HTTP response conversion
//! - [`password`]: Secure password hashing and verification
//! - [`permissions`]: Permission code constants
//!
//! # Example
//!
//! ```ignore
//! use greenlight_core::errors::AppError;
//! use greenlight_core::password::{hash_password, verify_password};
//!
//! let error = AppError::not_found(anyhow::anyhow!("movie not found"));
//! let hash = hash_password("pa55word")?;
//! ```

pub mod errors;
pub mod password;
pub mod permissions;

// Re-export commonly used types at crate root
pub use errors::{AppError, ErrorKind};
pub use password::{hash_password, verify_password};
