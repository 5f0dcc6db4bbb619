//! Password hashing with bcrypt.
//!
//! Plaintext passwords are never stored or compared directly; only the
//! salted bcrypt digest is persisted.

use anyhow::anyhow;
use bcrypt::{hash, verify};

use crate::errors::AppError;

/// Work factor for new hashes.
pub const BCRYPT_COST: u32 = 12;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, BCRYPT_COST)
        .map_err(|e| AppError::internal(anyhow!("failed to hash password: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::internal(anyhow!("failed to verify password: {e}")))
}
