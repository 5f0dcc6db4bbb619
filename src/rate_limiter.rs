//! Per-client request budgets.
//!
//! Each client address owns a [`governor`] token bucket refilled at the
//! configured rate and capped at the configured burst. All buckets live in
//! one registry guarded by a single mutex; fetch-or-create and the token
//! consumption happen in the same critical section, so concurrent requests
//! from one address are linearized and never spend more than the bucket held.
//!
//! A sweeper task drops buckets whose client has been quiet for longer than
//! the staleness window.

use std::collections::HashMap;
use std::net::IpAddr;
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail};
use governor::clock::{Clock, DefaultClock};
use governor::{DefaultDirectRateLimiter, Quota};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use greenlight_config::RateLimitConfig;

/// Smallest sweep period accepted; a zero interval would spin.
const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(10);

struct Client {
    limiter: DefaultDirectRateLimiter,
    last_seen: Instant,
}

/// Outcome of [`RateLimiter::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    /// The bucket is empty; one token will be available after `retry_after`.
    Limited { retry_after: Duration },
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Decision::Allowed)
    }
}

pub struct RateLimiter {
    config: RateLimitConfig,
    quota: Quota,
    clients: Mutex<HashMap<IpAddr, Client>>,
}

impl RateLimiter {
    /// Builds the registry. Fails when the rate is not a positive number or
    /// the burst is zero, since no request could ever be admitted.
    pub fn new(config: RateLimitConfig) -> anyhow::Result<Self> {
        let interval = config
            .replenish_interval()
            .ok_or_else(|| anyhow!("limiter-rps must be a positive number"))?;
        let Some(burst) = NonZeroU32::new(config.burst) else {
            bail!("limiter-burst must be at least 1");
        };
        let quota = Quota::with_period(interval)
            .ok_or_else(|| anyhow!("limiter-rps is too large"))?
            .allow_burst(burst);

        Ok(Self {
            config,
            quota,
            clients: Mutex::new(HashMap::new()),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    // A panic while holding the lock cannot leave a bucket half-updated, so
    // the map is still consistent after poisoning.
    fn clients(&self) -> MutexGuard<'_, HashMap<IpAddr, Client>> {
        self.clients.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Spends one token from `ip`'s bucket, creating a full bucket on first
    /// sight.
    pub fn check(&self, ip: IpAddr) -> Decision {
        let mut clients = self.clients();
        let client = clients.entry(ip).or_insert_with(|| Client {
            limiter: governor::RateLimiter::direct(self.quota),
            last_seen: Instant::now(),
        });
        client.last_seen = Instant::now();

        match client.limiter.check() {
            Ok(()) => Decision::Allowed,
            Err(not_until) => Decision::Limited {
                retry_after: not_until.wait_time_from(DefaultClock::default().now()),
            },
        }
    }

    /// Removes clients idle for longer than the staleness window and returns
    /// how many were dropped.
    pub fn sweep_stale(&self) -> usize {
        let stale_after = self.config.stale_after;
        let mut clients = self.clients();
        let before = clients.len();
        clients.retain(|_, client| client.last_seen.elapsed() <= stale_after);
        before - clients.len()
    }

    /// Number of clients currently tracked.
    pub fn len(&self) -> usize {
        self.clients().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs [`sweep_stale`](Self::sweep_stale) every sweep interval until
    /// `shutdown` is cancelled.
    pub fn spawn_sweeper(self: Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        let period = self.config.sweep_interval.max(MIN_SWEEP_INTERVAL);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let removed = self.sweep_stale();
                        if removed > 0 {
                            debug!(removed, remaining = self.len(), "swept idle rate limit clients");
                        }
                    }
                }
            }

            info!("rate limiter sweeper stopped");
        })
    }
}
