use std::time::Duration;

use anyhow::Context;
use tracing::{info, instrument, warn};

use greenlight_auth::{generate_token, hash_plaintext};
use greenlight_core::{AppError, verify_password};
use greenlight_db::{Models, StoreError, with_deadline};
use greenlight_models::{CreateAuthenticationTokenDto, EmailDto, Token, TokenScope, User};

use crate::state::AppState;
use crate::utils::email::Email;

/// Issues, redeems and revokes scoped bearer tokens.
///
/// Only the SHA-256 hash of a token reaches the store. Every store call is
/// bounded by the query deadline.
pub struct TokenService;

impl TokenService {
    /// Generates a token for `user_id` valid for `ttl` and persists its hash.
    ///
    /// The returned [`Token`] is the only place the plaintext exists. When the
    /// insert fails nothing has been written.
    #[instrument(skip(models))]
    pub async fn new_token(
        models: &Models,
        user_id: i64,
        ttl: Duration,
        scope: TokenScope,
    ) -> Result<Token, StoreError> {
        let token = generate_token(user_id, ttl, scope);
        with_deadline(models.tokens.insert(&token)).await?;
        Ok(token)
    }

    /// Owner of the unexpired `scope` token whose plaintext is `plaintext`.
    ///
    /// An unknown, expired, wrongly scoped or undecodable token is uniformly
    /// `RecordNotFound`.
    #[instrument(skip(models, plaintext))]
    pub async fn get_for_token(
        models: &Models,
        scope: TokenScope,
        plaintext: &str,
    ) -> Result<User, StoreError> {
        let hash = hash_plaintext(plaintext).ok_or(StoreError::RecordNotFound)?;
        with_deadline(models.users.get_for_token(scope, &hash)).await
    }

    /// Revokes every `scope` token held by `user_id`.
    #[instrument(skip(models))]
    pub async fn delete_all_for_user(
        models: &Models,
        scope: TokenScope,
        user_id: i64,
    ) -> Result<(), StoreError> {
        with_deadline(models.tokens.delete_all_for_user(scope, user_id)).await
    }

    /// Exchanges email and password for an authentication token.
    #[instrument(skip(state, dto), fields(email = %dto.email))]
    pub async fn create_authentication_token(
        state: &AppState,
        dto: CreateAuthenticationTokenDto,
    ) -> Result<Token, AppError> {
        let email = dto.email.to_lowercase();
        let user = match with_deadline(state.models.users.get_by_email(&email)).await {
            Ok(user) => user,
            Err(StoreError::RecordNotFound) => return Err(AppError::invalid_credentials()),
            Err(err) => return Err(err.into()),
        };

        if !verify_password(&dto.password, &user.password_hash)? {
            warn!(user_id = user.id, "failed login attempt");
            return Err(AppError::invalid_credentials());
        }

        let token = Self::new_token(
            &state.models,
            user.id,
            state.config.tokens.authentication_ttl,
            TokenScope::Authentication,
        )
        .await?;

        info!(user_id = user.id, "authentication token issued");
        Ok(token)
    }

    /// Sends a fresh activation token to an unactivated account.
    #[instrument(skip(state, dto), fields(email = %dto.email))]
    pub async fn create_activation_token(state: &AppState, dto: EmailDto) -> Result<(), AppError> {
        let user = Self::user_for_email(state, &dto.email).await?;
        if user.activated {
            return Err(AppError::failed_validation([(
                "email",
                "user has already been activated",
            )]));
        }

        let ttl = state.config.tokens.activation_ttl;
        let token =
            Self::new_token(&state.models, user.id, ttl, TokenScope::Activation).await?;

        send_in_background(
            state,
            "activation_email",
            Email::activation(&user.email, &token.plaintext, ttl),
        );
        Ok(())
    }

    /// Sends a password-reset token to an activated account.
    #[instrument(skip(state, dto), fields(email = %dto.email))]
    pub async fn create_password_reset_token(
        state: &AppState,
        dto: EmailDto,
    ) -> Result<(), AppError> {
        let user = Self::user_for_email(state, &dto.email).await?;
        if !user.activated {
            return Err(AppError::failed_validation([(
                "email",
                "user account must be activated",
            )]));
        }

        let ttl = state.config.tokens.password_reset_ttl;
        let token =
            Self::new_token(&state.models, user.id, ttl, TokenScope::PasswordReset).await?;

        send_in_background(
            state,
            "password_reset_email",
            Email::password_reset(&user.email, &token.plaintext, ttl),
        );
        Ok(())
    }

    async fn user_for_email(state: &AppState, email: &str) -> Result<User, AppError> {
        match with_deadline(state.models.users.get_by_email(&email.to_lowercase())).await {
            Ok(user) => Ok(user),
            Err(StoreError::RecordNotFound) => Err(AppError::failed_validation([(
                "email",
                "no matching email address found",
            )])),
            Err(err) => Err(err.into()),
        }
    }
}

/// Hands `email` to the mailer on the background runner; delivery failures
/// are logged there and never reach the client.
pub(crate) fn send_in_background(state: &AppState, name: &'static str, email: Email) {
    let mailer = state.mailer.clone();

    state.background.spawn(name, async move {
        let to = email.to.clone();
        if let Err(err) = mailer.send(email).await.context("email delivery failed") {
            tracing::error!(task = name, to = %to, error = ?err, "background email failed");
        }
    });
}
