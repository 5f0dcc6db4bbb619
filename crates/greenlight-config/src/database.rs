//! PostgreSQL connection settings.
//!
//! - `--db-dsn` / `GREENLIGHT_DB_DSN`: connection string; empty selects the
//!   in-memory store
//! - `--db-max-open-conns` / `DB_MAX_OPEN_CONNS` (default: 25)
//! - `--db-max-idle-time` / `DB_MAX_IDLE_TIME` (default: 15m)

use std::time::Duration;

use clap::Args;

use crate::duration::parse_duration;

#[derive(Clone, Debug, PartialEq, Eq, Args)]
pub struct DatabaseConfig {
    #[arg(
        long = "db-dsn",
        env = "GREENLIGHT_DB_DSN",
        default_value = "",
        hide_env_values = true
    )]
    pub dsn: String,

    #[arg(long = "db-max-open-conns", env = "DB_MAX_OPEN_CONNS", default_value_t = 25)]
    pub max_open_conns: u32,

    #[arg(
        long = "db-max-idle-time",
        env = "DB_MAX_IDLE_TIME",
        default_value = "15m",
        value_parser = parse_duration
    )]
    pub max_idle_time: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            dsn: String::new(),
            max_open_conns: 25,
            max_idle_time: Duration::from_secs(15 * 60),
        }
    }
}

impl DatabaseConfig {
    pub fn is_configured(&self) -> bool {
        !self.dsn.trim().is_empty()
    }
}
