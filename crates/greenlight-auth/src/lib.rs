//! # Greenlight Auth
//!
//! Bearer token primitives for the Greenlight API.
//!
//! This crate provides:
//!
//! - [`tokens`]: generation of random token plaintexts and the one-way hash
//!   that is the only form ever persisted
//!
//! Storage and lookup of tokens live with the persistence layer; this crate
//! never touches the store.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use greenlight_auth::{generate_token, hash_plaintext};
//! use greenlight_models::TokenScope;
//!
//! let token = generate_token(user.id, Duration::from_secs(3600), TokenScope::Authentication);
//!
//! // Later, when the client presents the plaintext:
//! let hash = hash_plaintext(&presented).ok_or(StoreError::RecordNotFound)?;
//! ```

pub mod tokens;

pub use tokens::{TOKEN_ENTROPY_BYTES, generate_token, hash_plaintext};
