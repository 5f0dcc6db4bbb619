//! Rate limiting configuration.
//!
//! Every client address gets its own token bucket:
//!
//! - Tokens are added at `requests_per_second`
//! - Each request consumes one token
//! - `burst` is the maximum number of tokens a bucket can hold
//! - Requests are rejected when the bucket is empty
//!
//! Buckets for clients that have been quiet for longer than `stale_after` are
//! dropped by a sweep running every `sweep_interval`.
//!
//! # Flags
//!
//! - `--limiter-enabled` / `LIMITER_ENABLED` (default: true)
//! - `--limiter-rps` / `LIMITER_RPS` (default: 2)
//! - `--limiter-burst` / `LIMITER_BURST` (default: 4)
//! - `--limiter-sweep-interval` / `LIMITER_SWEEP_INTERVAL` (default: 1m)
//! - `--limiter-stale-after` / `LIMITER_STALE_AFTER` (default: 3m)

use std::time::Duration;

use clap::{ArgAction, Args};

use crate::duration::parse_duration;

#[derive(Clone, Debug, PartialEq, Args)]
pub struct RateLimitConfig {
    /// Enable per-client rate limiting.
    #[arg(
        long = "limiter-enabled",
        env = "LIMITER_ENABLED",
        default_value_t = true,
        action = ArgAction::Set
    )]
    pub enabled: bool,

    /// Token replenishment rate of each client bucket.
    #[arg(long = "limiter-rps", env = "LIMITER_RPS", default_value_t = 2.0)]
    pub requests_per_second: f64,

    /// Maximum tokens a client bucket can accumulate.
    #[arg(long = "limiter-burst", env = "LIMITER_BURST", default_value_t = 4)]
    pub burst: u32,

    /// How often idle clients are swept from the registry.
    #[arg(
        long = "limiter-sweep-interval",
        env = "LIMITER_SWEEP_INTERVAL",
        default_value = "1m",
        value_parser = parse_duration
    )]
    pub sweep_interval: Duration,

    /// Idle time after which a client's bucket is discarded.
    #[arg(
        long = "limiter-stale-after",
        env = "LIMITER_STALE_AFTER",
        default_value = "3m",
        value_parser = parse_duration
    )]
    pub stale_after: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_second: 2.0,
            burst: 4,
            sweep_interval: Duration::from_secs(60),
            stale_after: Duration::from_secs(180),
        }
    }
}

impl RateLimitConfig {
    /// Config with limiting switched off.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Interval between two replenished tokens, `None` when the rate is not
    /// a positive finite number.
    #[must_use]
    pub fn replenish_interval(&self) -> Option<Duration> {
        if self.requests_per_second.is_finite() && self.requests_per_second > 0.0 {
            Some(Duration::from_secs_f64(1.0 / self.requests_per_second))
        } else {
            None
        }
    }
}
