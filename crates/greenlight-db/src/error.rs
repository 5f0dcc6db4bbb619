use std::time::Duration;

use anyhow::anyhow;
use thiserror::Error;

use greenlight_core::AppError;

/// Constraint backing the one-account-per-email rule.
pub(crate) const USERS_EMAIL_KEY: &str = "users_email_key";

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    RecordNotFound,

    #[error("edit conflict")]
    EditConflict,

    #[error("duplicate email")]
    DuplicateEmail,

    #[error("store call exceeded its {0:?} deadline")]
    Timeout(Duration),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::RecordNotFound,
            sqlx::Error::Database(ref db)
                if db.is_unique_violation() && db.constraint() == Some(USERS_EMAIL_KEY) =>
            {
                StoreError::DuplicateEmail
            }
            other => StoreError::Database(other),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::RecordNotFound => {
                AppError::not_found(anyhow!("the requested resource could not be found"))
            }
            StoreError::EditConflict => AppError::edit_conflict(),
            StoreError::DuplicateEmail => AppError::failed_validation([(
                "email",
                "a user with this email address already exists",
            )]),
            StoreError::Timeout(_) => AppError::upstream_unavailable(err),
            StoreError::Database(_) => AppError::internal(err),
        }
    }
}
