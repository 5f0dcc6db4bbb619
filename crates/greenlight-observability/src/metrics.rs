use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::time::Instant;
use tracing::warn;

pub use metrics_exporter_prometheus::PrometheusHandle as MetricsHandle;

const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Install the process-wide Prometheus recorder.
///
/// Returns `None` when a recorder is already installed; metrics calls are
/// then no-ops.
pub fn init_metrics() -> Option<MetricsHandle> {
    let builder = match PrometheusBuilder::new().set_buckets_for_metric(
        Matcher::Full("http_request_duration_seconds".to_string()),
        LATENCY_BUCKETS,
    ) {
        Ok(builder) => builder,
        Err(err) => {
            warn!(error = %err, "invalid latency buckets, metrics disabled");
            return None;
        }
    };

    match builder.install_recorder() {
        Ok(handle) => Some(handle),
        Err(err) => {
            warn!(error = %err, "failed to install Prometheus recorder, metrics disabled");
            None
        }
    }
}

/// Counts requests and responses and records latency per matched route.
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().as_str().to_owned();
    let uri_path = req.uri().path().to_owned();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or(uri_path);

    counter!("http_requests_received_total").increment(1);
    gauge!("http_requests_active").increment(1.0);

    let response = next.run(req).await;

    let status = response.status().as_u16().to_string();
    counter!("http_responses_sent_total", "status" => status).increment(1);
    histogram!("http_request_duration_seconds", "method" => method, "path" => path)
        .record(start.elapsed().as_secs_f64());
    gauge!("http_requests_active").decrement(1.0);

    response
}

/// A request rejected by the per-client rate limiter.
pub fn track_rate_limited() {
    counter!("rate_limited_requests_total").increment(1);
}

/// A background task that panicked instead of completing.
pub fn track_background_panic() {
    counter!("background_task_panics_total").increment(1);
}
