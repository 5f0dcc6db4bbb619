use tracing::{info, instrument};

use greenlight_core::{AppError, hash_password, permissions::DEFAULT_GRANTS};
use greenlight_db::{NewUser, StoreError, with_deadline};
use greenlight_models::{ActivateUserDto, RegisterUserDto, ResetPasswordDto, TokenScope, User};

use crate::modules::tokens::service::{TokenService, send_in_background};
use crate::state::AppState;
use crate::utils::email::Email;

pub struct UserService;

impl UserService {
    /// Creates an unactivated user holding the default permissions and mails
    /// the first activation token in the background.
    #[instrument(skip(state, dto), fields(email = %dto.email))]
    pub async fn register_user(state: &AppState, dto: RegisterUserDto) -> Result<User, AppError> {
        let password_hash = hash_password(&dto.password)?;

        let user = with_deadline(state.models.users.insert(NewUser {
            name: dto.name,
            email: dto.email.to_lowercase(),
            password_hash,
            activated: false,
        }))
        .await?;

        with_deadline(state.models.permissions.add_for_user(user.id, DEFAULT_GRANTS)).await?;

        let ttl = state.config.tokens.activation_ttl;
        let token =
            TokenService::new_token(&state.models, user.id, ttl, TokenScope::Activation).await?;

        send_in_background(
            state,
            "welcome_email",
            Email::welcome(&user.email, user.id, &token.plaintext, ttl),
        );

        info!(user_id = user.id, "user registered");
        Ok(user)
    }

    /// Redeems an activation token and revokes every other activation token
    /// of the same user.
    #[instrument(skip(state, dto))]
    pub async fn activate_user(state: &AppState, dto: ActivateUserDto) -> Result<User, AppError> {
        let mut user = Self::redeem(state, TokenScope::Activation, &dto.token).await?;

        user.activated = true;
        let user = with_deadline(state.models.users.update(&user)).await?;

        TokenService::delete_all_for_user(&state.models, TokenScope::Activation, user.id).await?;

        info!(user_id = user.id, "user activated");
        Ok(user)
    }

    /// Redeems a password-reset token and stores the new password hash.
    #[instrument(skip(state, dto))]
    pub async fn reset_password(state: &AppState, dto: ResetPasswordDto) -> Result<(), AppError> {
        let mut user = Self::redeem(state, TokenScope::PasswordReset, &dto.token).await?;

        user.password_hash = hash_password(&dto.password)?;
        let user = with_deadline(state.models.users.update(&user)).await?;

        TokenService::delete_all_for_user(&state.models, TokenScope::PasswordReset, user.id)
            .await?;

        info!(user_id = user.id, "password reset");
        Ok(())
    }

    async fn redeem(state: &AppState, scope: TokenScope, plaintext: &str) -> Result<User, AppError> {
        match TokenService::get_for_token(&state.models, scope, plaintext).await {
            Ok(user) => Ok(user),
            Err(StoreError::RecordNotFound) => Err(AppError::failed_validation([(
                "token",
                "invalid or expired token",
            )])),
            Err(err) => Err(err.into()),
        }
    }
}
