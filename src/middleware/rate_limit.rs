use std::net::{IpAddr, SocketAddr};

use anyhow::anyhow;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use tracing::debug;

use greenlight_core::AppError;
use greenlight_observability::track_rate_limited;

use crate::rate_limiter::Decision;
use crate::state::AppState;

/// Client address: first `X-Forwarded-For` entry, then `X-Real-IP`, then the
/// socket peer.
pub(crate) fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<IpAddr> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .and_then(|first| first.trim().parse().ok());

    forwarded
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse().ok())
        })
        .or_else(|| peer.map(|addr| addr.ip()))
}

/// Spends one token from the caller's bucket or rejects with 429 and
/// `Retry-After`. Passes everything through when the limiter is disabled.
pub async fn rate_limit(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !state.limiter.is_enabled() {
        return Ok(next.run(req).await);
    }

    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let ip = client_ip(req.headers(), peer)
        .ok_or_else(|| AppError::internal(anyhow!("unable to determine client address")))?;

    if let Decision::Limited { retry_after } = state.limiter.check(ip) {
        track_rate_limited();
        debug!(%ip, ?retry_after, "rate limit exceeded");
        let seconds = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
        return Err(AppError::rate_limited(Some(seconds.max(1))));
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use std::net::Ipv4Addr;

    fn peer() -> Option<SocketAddr> {
        Some(SocketAddr::from(([192, 0, 2, 1], 40000)))
    }

    #[test]
    fn test_forwarded_for_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));

        assert_eq!(
            client_ip(&headers, peer()),
            Some(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 7)))
        );
    }

    #[test]
    fn test_real_ip_then_peer() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(
            client_ip(&headers, peer()),
            Some(IpAddr::V4(Ipv4Addr::new(198, 51, 100, 2)))
        );

        assert_eq!(
            client_ip(&HeaderMap::new(), peer()),
            Some(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)))
        );
    }

    #[test]
    fn test_unparseable_forwarded_for_falls_back() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("unknown"));
        assert_eq!(
            client_ip(&headers, peer()),
            Some(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)))
        );
        assert_eq!(client_ip(&headers, None), None);
    }
}
