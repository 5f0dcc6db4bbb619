mod common;

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use futures::future::join_all;
use greenlight::greenlight_config::{AppConfig, RateLimitConfig};
use greenlight::rate_limiter::RateLimiter;
use tokio_util::sync::CancellationToken;
use common::{get, send, setup_test_app_with_config};

fn limited_app(requests_per_second: f64, burst: u32) -> common::TestApp {
    setup_test_app_with_config(AppConfig {
        limiter: RateLimitConfig {
            requests_per_second,
            burst,
            ..RateLimitConfig::default()
        },
        ..AppConfig::default()
    })
}

fn from_ip(ip: &str) -> Request<Body> {
    common::request("GET", "/v1/healthcheck")
        .header("x-forwarded-for", ip)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_burst_then_one_per_second() {
    let app = limited_app(1.0, 3);

    for attempt in 0..3 {
        let response = app.send(get("/v1/healthcheck")).await;
        assert_eq!(response.status, StatusCode::OK, "attempt {attempt}");
    }

    let response = app.send(get("/v1/healthcheck")).await;
    assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.error_code(), "rate_limit_exceeded");
    assert!(response.headers.get(header::RETRY_AFTER).is_some());

    tokio::time::sleep(Duration::from_millis(1100)).await;

    let response = app.send(get("/v1/healthcheck")).await;
    assert_eq!(response.status, StatusCode::OK);
    let response = app.send(get("/v1/healthcheck")).await;
    assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_different_ips_have_separate_limits() {
    let app = limited_app(1.0, 1);

    assert_eq!(app.send(from_ip("10.0.0.1")).await.status, StatusCode::OK);
    assert_eq!(
        app.send(from_ip("10.0.0.1")).await.status,
        StatusCode::TOO_MANY_REQUESTS
    );
    assert_eq!(app.send(from_ip("10.0.0.2")).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_forwarded_for_uses_first_entry() {
    let app = limited_app(1.0, 1);

    assert_eq!(
        app.send(from_ip("198.51.100.4, 10.0.0.1")).await.status,
        StatusCode::OK
    );
    // Same originating client behind a different proxy.
    assert_eq!(
        app.send(from_ip("198.51.100.4, 10.0.0.9")).await.status,
        StatusCode::TOO_MANY_REQUESTS
    );
}

#[tokio::test]
async fn test_disabled_limiter_passes_everything() {
    let app = setup_test_app_with_config(AppConfig {
        limiter: RateLimitConfig {
            burst: 1,
            ..RateLimitConfig::disabled()
        },
        ..AppConfig::default()
    });

    for _ in 0..10 {
        assert_eq!(app.send(get("/v1/healthcheck")).await.status, StatusCode::OK);
    }
    assert!(app.state.limiter.is_empty());
}

#[tokio::test]
async fn test_limited_request_never_reaches_authentication() {
    let app = limited_app(1.0, 1);

    assert_eq!(app.send(get("/v1/healthcheck")).await.status, StatusCode::OK);

    let req = common::request("GET", "/v1/healthcheck")
        .header("authorization", "garbage")
        .body(Body::empty())
        .unwrap();
    let response = app.send(req).await;
    assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_never_overspend() {
    // One token per 100 seconds: nothing refills during the test.
    let app = limited_app(0.01, 5);

    let requests = (0..40).map(|_| send(app.router.clone(), get("/v1/healthcheck")));
    let responses = join_all(requests).await;

    let allowed = responses
        .iter()
        .filter(|response| response.status == StatusCode::OK)
        .count();
    let limited = responses
        .iter()
        .filter(|response| response.status == StatusCode::TOO_MANY_REQUESTS)
        .count();

    assert_eq!(allowed, 5);
    assert_eq!(limited, 35);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_checks_on_shared_limiter() {
    let limiter = Arc::new(
        RateLimiter::new(RateLimitConfig {
            requests_per_second: 0.01,
            burst: 8,
            ..RateLimitConfig::default()
        })
        .unwrap(),
    );
    let ip = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 50));

    let handles: Vec<_> = (0..64)
        .map(|_| {
            let limiter = Arc::clone(&limiter);
            tokio::spawn(async move { limiter.check(ip).is_allowed() })
        })
        .collect();

    let mut allowed = 0;
    for handle in handles {
        if handle.await.unwrap() {
            allowed += 1;
        }
    }
    assert_eq!(allowed, 8);
}

#[tokio::test]
async fn test_sweeper_evicts_idle_clients() {
    let limiter = Arc::new(
        RateLimiter::new(RateLimitConfig {
            sweep_interval: Duration::from_millis(20),
            stale_after: Duration::from_millis(50),
            ..RateLimitConfig::default()
        })
        .unwrap(),
    );
    limiter.check(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)));
    limiter.check(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 2)));
    assert_eq!(limiter.len(), 2);

    let shutdown = CancellationToken::new();
    let sweeper = Arc::clone(&limiter).spawn_sweeper(shutdown.clone());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(limiter.is_empty());

    shutdown.cancel();
    sweeper.await.unwrap();
}
