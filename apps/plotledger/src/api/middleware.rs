//! Rate limiting for the PlotLedger HTTP API.
//!
//! One process-wide limiter covers every route, sized by
//! `PLOTLEDGER_RATE_LIMIT` in requests per second. An explicit `0` turns
//! the limiter off entirely; whether a limiter exists at all is decided
//! here, not by the router.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Applied when `PLOTLEDGER_RATE_LIMIT` is unset or unparsable.
const DEFAULT_RPS: u32 = 100;

// =============================================================================
// RATE LIMITER
// =============================================================================

/// Global rate limiter type alias.
pub type GlobalRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Resolve the configured limiter, if any.
///
/// Reads `PLOTLEDGER_RATE_LIMIT` once at router build time. Unset or
/// unparsable values fall back to 100 requests per second; an explicit 0
/// disables rate limiting and yields `None`.
pub fn rate_limiter_from_env() -> Option<GlobalRateLimiter> {
    let rps = std::env::var("PLOTLEDGER_RATE_LIMIT")
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(DEFAULT_RPS);

    match limiter_for(rps) {
        Some(limiter) => {
            tracing::info!("Rate limiting enabled: {} requests/second", rps);
            Some(limiter)
        }
        None => {
            tracing::info!("Rate limiting disabled (PLOTLEDGER_RATE_LIMIT=0)");
            None
        }
    }
}

/// Build a limiter admitting `rps` requests per second, `None` for 0.
fn limiter_for(rps: u32) -> Option<GlobalRateLimiter> {
    let quota = Quota::per_second(NonZeroU32::new(rps)?);
    Some(Arc::new(RateLimiter::direct(quota)))
}

// =============================================================================
// MIDDLEWARE
// =============================================================================

/// Reject requests beyond the global rate with 429 Too Many Requests.
pub async fn rate_limit_middleware(
    State(limiter): State<GlobalRateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    if limiter.check().is_err() {
        tracing::warn!(
            path = %request.uri().path(),
            "request rejected by rate limiter"
        );
        return Err((StatusCode::TOO_MANY_REQUESTS, "Too Many Requests"));
    }
    Ok(next.run(request).await)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rps_yields_no_limiter() {
        assert!(limiter_for(0).is_none());
    }

    #[test]
    fn limiter_admits_an_initial_request() {
        let limiter = limiter_for(50).expect("limiter");
        assert!(limiter.check().is_ok());
    }
}
