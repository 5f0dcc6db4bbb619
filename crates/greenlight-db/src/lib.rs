//! # Greenlight DB
//!
//! Persistence layer for the Greenlight API.
//!
//! The request pipeline talks to storage only through the repository traits
//! in [`repositories`], bundled in the cloneable [`Models`] facade. Two
//! implementations exist:
//!
//! - [`PgStore`]: PostgreSQL through SQLx
//! - [`MemoryStore`]: in-process maps, used by tests and by deployments
//!   without a DSN
//!
//! Every call made on behalf of a request should go through [`with_deadline`]
//! so a slow store fails the request instead of stalling it.
//!
//! # Example
//!
//! ```ignore
//! use greenlight_db::{Models, init_db_pool, with_deadline};
//!
//! let pool = init_db_pool(&config.db).await?;
//! let models = Models::postgres(pool);
//! let user = with_deadline(models.users.get_by_email("alice@example.com")).await?;
//! ```

pub mod error;
pub mod memory;
pub mod postgres;
pub mod repositories;

use std::future::Future;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tracing::info;

use greenlight_config::DatabaseConfig;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use repositories::{
    Models, MovieRepository, NewUser, PermissionRepository, TokenRepository, UserRepository,
};

// Re-export PgPool for convenience
pub use sqlx::PgPool;

/// Upper bound on a single store call made while serving a request.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(3);

/// Time allowed for the startup connectivity check.
const PING_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs a store call, failing with [`StoreError::Timeout`] once
/// [`QUERY_TIMEOUT`] has elapsed.
pub async fn with_deadline<T, F>(call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(QUERY_TIMEOUT, call)
        .await
        .unwrap_or(Err(StoreError::Timeout(QUERY_TIMEOUT)))
}

/// Opens a PostgreSQL pool with the configured limits and verifies the
/// connection within five seconds.
///
/// The pool is cheaply cloneable and should be created once at startup.
pub async fn init_db_pool(config: &DatabaseConfig) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_open_conns)
        .idle_timeout(config.max_idle_time)
        .connect_lazy(&config.dsn)?;

    tokio::time::timeout(PING_TIMEOUT, sqlx::query("SELECT 1").execute(&pool))
        .await
        .map_err(|_| anyhow::anyhow!("database did not answer within {PING_TIMEOUT:?}"))??;

    info!(
        max_open_conns = config.max_open_conns,
        max_idle_time = ?config.max_idle_time,
        "database connection pool established"
    );

    Ok(pool)
}

/// Applies the SQL migrations under `migrations/`.
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}
