use crate::error::AppError;
use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    Quota, RateLimiter,
    clock::{Clock, DefaultClock},
    state::keyed::DashMapStateStore,
};
use std::{
    net::{IpAddr, SocketAddr},
    num::NonZeroU32,
    sync::Arc,
    time::Duration,
};

/// Rate limiter keyed by client IP address
pub type IpRateLimiter = Arc<RateLimiter<IpAddr, DashMapStateStore<IpAddr>, DefaultClock>>;

/// Create a keyed rate limiter allowing `attempts` per `window_seconds` per IP.
pub fn create_ip_rate_limiter(attempts: u32, window_seconds: u64) -> IpRateLimiter {
    let attempts = NonZeroU32::new(attempts).unwrap_or(NonZeroU32::MIN);
    let period_ms = (window_seconds.max(1) * 1000) / u64::from(attempts.get());
    let period = Duration::from_millis(period_ms.max(1));

    // `period` is never zero, so `with_period` always yields a quota.
    let quota = Quota::with_period(period)
        .unwrap_or_else(|| Quota::per_second(attempts))
        .allow_burst(attempts);

    Arc::new(RateLimiter::dashmap(quota))
}

/// Client IP: first `x-forwarded-for` hop, else the socket peer address.
pub fn client_ip(request: &Request) -> Option<IpAddr> {
    let forwarded_ip = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok());

    forwarded_ip.or_else(|| {
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
    })
}

/// Middleware for IP-based rate limiting
pub async fn ip_rate_limit_middleware(
    State(limiter): State<IpRateLimiter>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    match client_ip(&request) {
        Some(ip) => match limiter.check_key(&ip) {
            Ok(_) => Ok(next.run(request).await),
            Err(negative) => {
                let wait_time = negative.wait_time_from(DefaultClock::default().now());
                tracing::warn!(client_ip = %ip, "Rate limit exceeded");
                Err(AppError::TooManyRequests(
                    "Too many requests from this IP. Please try again later.".to_string(),
                    Some(wait_time.as_secs().max(1)),
                ))
            }
        },
        None => {
            tracing::warn!("Could not determine IP for rate limiting");
            Ok(next.run(request).await)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::StatusCode,
        middleware::from_fn_with_state,
        routing::post,
    };
    use tower::util::ServiceExt;

    fn app(limiter: IpRateLimiter) -> Router {
        Router::new()
            .route("/login", post(|| async { "ok" }))
            .layer(from_fn_with_state(limiter, ip_rate_limit_middleware))
    }

    fn request_from(ip: &str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/login")
            .header("x-forwarded-for", ip)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_blocks_after_burst_is_spent() {
        let limiter = create_ip_rate_limiter(2, 60);

        for _ in 0..2 {
            let response = app(limiter.clone())
                .oneshot(request_from("10.0.0.1"))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app(limiter.clone())
            .oneshot(request_from("10.0.0.1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(
            response
                .headers()
                .contains_key(axum::http::header::RETRY_AFTER)
        );

        // Other clients keep their own budget.
        let response = app(limiter)
            .oneshot(request_from("10.0.0.2"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_ip_is_not_limited() {
        let limiter = create_ip_rate_limiter(1, 60);

        for _ in 0..3 {
            let response = app(limiter.clone())
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri("/login")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }
}
