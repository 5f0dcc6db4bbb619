use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use greenlight::greenlight_config::AppConfig;
use greenlight::router::init_router;
use greenlight::state::init_app_state;
use greenlight_observability::{init_logging, init_metrics};

/// How long shutdown waits for background work such as outgoing email.
const BACKGROUND_GRACE: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = AppConfig::parse();
    init_logging();
    let metrics = init_metrics();

    let port = config.port;
    let environment = config.environment;
    let state = init_app_state(config).await?.with_metrics(metrics);

    let shutdown = CancellationToken::new();
    let sweeper = state.limiter.clone().spawn_sweeper(shutdown.child_token());
    let background = state.background.clone();

    let app = init_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, env = %environment, "starting server");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    shutdown.cancel();
    if let Err(err) = sweeper.await {
        warn!(error = %err, "rate limiter sweeper did not stop cleanly");
    }

    if !background.shutdown(BACKGROUND_GRACE).await {
        warn!("exiting with background tasks still running");
    }

    info!(%addr, "stopped server");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!(signal = "SIGINT", "shutting down server"),
        _ = terminate => info!(signal = "SIGTERM", "shutting down server"),
    }
}
