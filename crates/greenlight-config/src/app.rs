use std::fmt;

use clap::{Parser, ValueEnum};

use crate::{CorsConfig, DatabaseConfig, EmailConfig, RateLimitConfig, TokenConfig};

/// Deployment environment reported by the healthcheck.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complete server configuration.
#[derive(Clone, Debug, PartialEq, Parser)]
#[command(name = "greenlight", version, about = "Greenlight JSON API server")]
pub struct AppConfig {
    /// API server port.
    #[arg(long, env = "PORT", default_value_t = 4000)]
    pub port: u16,

    /// Environment (development|staging|production).
    #[arg(
        long = "env",
        env = "GREENLIGHT_ENV",
        value_enum,
        default_value_t = Environment::Development
    )]
    pub environment: Environment,

    #[command(flatten)]
    pub db: DatabaseConfig,

    #[command(flatten)]
    pub limiter: RateLimitConfig,

    #[command(flatten)]
    pub tokens: TokenConfig,

    #[command(flatten)]
    pub smtp: EmailConfig,

    #[command(flatten)]
    pub cors: CorsConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 4000,
            environment: Environment::default(),
            db: DatabaseConfig::default(),
            limiter: RateLimitConfig::default(),
            tokens: TokenConfig::default(),
            smtp: EmailConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}
