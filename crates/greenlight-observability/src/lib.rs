//! Greenlight Observability
//!
//! - Structured logging with `tracing` (always available)
//! - HTTP request logging middleware (always available)
//! - Prometheus metrics, rendered at `/debug/vars`
//!
//! Metrics are compiled in with the `observability` feature (default). Without
//! it the same functions exist as no-ops so call sites need no `cfg`.
//!
//! # Examples
//!
//! ```no_run
//! use greenlight_observability::{init_logging, init_metrics};
//!
//! init_logging();
//! let metrics = init_metrics();
//! ```

pub mod logging;
#[cfg(feature = "observability")]
pub mod metrics;

pub use logging::{init_logging, logging_middleware};

#[cfg(feature = "observability")]
pub use metrics::{
    MetricsHandle, init_metrics, metrics_middleware, track_background_panic, track_rate_limited,
};

// No-op stubs when observability is disabled
#[cfg(not(feature = "observability"))]
pub mod stubs {
    use axum::{extract::Request, middleware::Next, response::Response};

    /// Stand-in for the Prometheus handle; renders nothing.
    #[derive(Clone, Debug)]
    pub struct MetricsHandle;

    impl MetricsHandle {
        pub fn render(&self) -> String {
            String::new()
        }
    }

    /// No-op metrics initialization when feature disabled
    pub fn init_metrics() -> Option<MetricsHandle> {
        None
    }

    /// No-op metrics middleware when feature disabled
    pub async fn metrics_middleware(req: Request, next: Next) -> Response {
        next.run(req).await
    }

    pub fn track_rate_limited() {}
    pub fn track_background_panic() {}
}

#[cfg(not(feature = "observability"))]
pub use stubs::*;
