//! User domain models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A registered user.
///
/// The password hash and the optimistic-locking version never leave the
/// server.
#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub activated: bool,
    #[serde(skip)]
    pub version: i32,
}

/// `POST /v1/users`
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct RegisterUserDto {
    #[validate(length(min = 1, max = 500, message = "must be between 1 and 500 bytes long"))]
    pub name: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, max = 72, message = "must be between 8 and 72 bytes long"))]
    pub password: String,
}

/// `PUT /v1/users/activated`
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ActivateUserDto {
    #[validate(length(equal = 26, message = "must be 26 bytes long"))]
    pub token: String,
}

/// `PUT /v1/users/password`
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ResetPasswordDto {
    #[validate(length(min = 8, max = 72, message = "must be between 8 and 72 bytes long"))]
    pub password: String,
    #[validate(length(equal = 26, message = "must be 26 bytes long"))]
    pub token: String,
}

/// `POST /v1/tokens/authentication`
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateAuthenticationTokenDto {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, max = 72, message = "must be between 8 and 72 bytes long"))]
    pub password: String,
}

/// `POST /v1/tokens/activation` and `POST /v1/tokens/password-reset`
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct EmailDto {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
}
