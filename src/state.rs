use std::sync::Arc;

use anyhow::Context;
use tracing::warn;

use greenlight_config::AppConfig;
use greenlight_db::{Models, init_db_pool, run_migrations};
use greenlight_observability::MetricsHandle;

use crate::background::BackgroundRunner;
use crate::rate_limiter::RateLimiter;
use crate::utils::email::{Mailer, mailer_from_config};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub models: Models,
    pub limiter: Arc<RateLimiter>,
    pub background: BackgroundRunner,
    pub mailer: Arc<dyn Mailer>,
    pub metrics: Option<MetricsHandle>,
}

impl AppState {
    pub fn new(config: AppConfig, models: Models, mailer: Arc<dyn Mailer>) -> anyhow::Result<Self> {
        let limiter = RateLimiter::new(config.limiter.clone()).context("invalid rate limiter settings")?;

        Ok(Self {
            config: Arc::new(config),
            models,
            limiter: Arc::new(limiter),
            background: BackgroundRunner::new(),
            mailer,
            metrics: None,
        })
    }

    pub fn with_metrics(mut self, metrics: Option<MetricsHandle>) -> Self {
        self.metrics = metrics;
        self
    }
}

/// Builds the state for the server binary: PostgreSQL when a DSN is
/// configured, the in-memory store otherwise.
pub async fn init_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let models = if config.db.is_configured() {
        let pool = init_db_pool(&config.db).await?;
        run_migrations(&pool).await.context("failed to run migrations")?;
        Models::postgres(pool)
    } else {
        warn!("no database DSN configured, using the in-memory store; data will not persist");
        Models::memory()
    };

    let mailer = mailer_from_config(&config.smtp)?;

    AppState::new(config, models, mailer)
}
