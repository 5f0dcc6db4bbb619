//! Token lifetimes per scope.
//!
//! - `--activation-token-ttl` / `ACTIVATION_TOKEN_TTL` (default: 72h)
//! - `--authentication-token-ttl` / `AUTHENTICATION_TOKEN_TTL` (default: 24h)
//! - `--password-reset-token-ttl` / `PASSWORD_RESET_TOKEN_TTL` (default: 45m)
//!
//! Each lifetime must be non-zero and at most [`MAX_TOKEN_TTL`].

use std::time::Duration;

use clap::Args;

use crate::duration::parse_duration;

/// Longest accepted token lifetime (365 days). Keeps every expiry well
/// inside the range of a PostgreSQL `timestamptz`.
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// [`parse_duration`] restricted to `1s..=MAX_TOKEN_TTL`.
pub fn parse_token_ttl(input: &str) -> Result<Duration, String> {
    let ttl = parse_duration(input)?;
    if ttl.is_zero() {
        return Err("token ttl must be greater than zero".to_string());
    }
    if ttl > MAX_TOKEN_TTL {
        return Err(format!("token ttl '{input}' exceeds the 365d maximum"));
    }
    Ok(ttl)
}

#[derive(Clone, Debug, PartialEq, Eq, Args)]
pub struct TokenConfig {
    #[arg(
        long = "activation-token-ttl",
        env = "ACTIVATION_TOKEN_TTL",
        default_value = "72h",
        value_parser = parse_token_ttl
    )]
    pub activation_ttl: Duration,

    #[arg(
        long = "authentication-token-ttl",
        env = "AUTHENTICATION_TOKEN_TTL",
        default_value = "24h",
        value_parser = parse_token_ttl
    )]
    pub authentication_ttl: Duration,

    #[arg(
        long = "password-reset-token-ttl",
        env = "PASSWORD_RESET_TOKEN_TTL",
        default_value = "45m",
        value_parser = parse_token_ttl
    )]
    pub password_reset_ttl: Duration,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            activation_ttl: Duration::from_secs(3 * 24 * 60 * 60),
            authentication_ttl: Duration::from_secs(24 * 60 * 60),
            password_reset_ttl: Duration::from_secs(45 * 60),
        }
    }
}
