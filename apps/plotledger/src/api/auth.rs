//! Bearer-key authentication for the PlotLedger HTTP API.
//!
//! When `PLOTLEDGER_API_KEY` is set, every route outside [`OPEN_ROUTES`]
//! requires `Authorization: Bearer <key>`. The key is resolved once when
//! the router is built and carried as middleware state, so a changed key
//! takes effect on restart rather than mid-flight.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Routes reachable without a key. `/health` stays open so load balancers
/// and container probes can check liveness before they hold credentials.
const OPEN_ROUTES: &[&str] = &["/health"];

// =============================================================================
// API KEY
// =============================================================================

/// The configured API key, shared with [`require_api_key`] as axum state.
#[derive(Clone)]
pub struct ApiKey(Arc<str>);

impl ApiKey {
    /// Read `PLOTLEDGER_API_KEY`. Unset or empty means auth is off.
    pub fn from_env() -> Option<Self> {
        std::env::var("PLOTLEDGER_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .map(|k| Self(k.into()))
    }

    /// Constant-time check of a presented credential.
    ///
    /// Both sides are padded to a common width before comparison so the
    /// work done never depends on how much of the key matched, and a
    /// separate length check keeps padding from equating distinct keys.
    fn accepts(&self, presented: &str) -> bool {
        let expected = self.0.as_bytes();
        let presented = presented.as_bytes();

        let width = expected.len().max(presented.len());
        let mut lhs = vec![0u8; width];
        let mut rhs = vec![0u8; width];
        lhs[..expected.len()].copy_from_slice(expected);
        rhs[..presented.len()].copy_from_slice(presented);

        let same_bytes: bool = lhs.ct_eq(&rhs).into();
        same_bytes && expected.len() == presented.len()
    }
}

// =============================================================================
// MIDDLEWARE
// =============================================================================

/// Require a valid Bearer key on every route outside [`OPEN_ROUTES`].
///
/// The header value is accepted with or without the `Bearer ` prefix.
pub async fn require_api_key(
    State(key): State<ApiKey>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    if OPEN_ROUTES.contains(&request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.strip_prefix("Bearer ").unwrap_or(v));

    match presented {
        Some(candidate) if key.accepts(candidate) => Ok(next.run(request).await),
        Some(_) => {
            tracing::warn!(
                path = %request.uri().path(),
                "request rejected: wrong api key"
            );
            Err((StatusCode::UNAUTHORIZED, "Unauthorized"))
        }
        None => {
            tracing::warn!(
                path = %request.uri().path(),
                "request rejected: no authorization header"
            );
            Err((StatusCode::UNAUTHORIZED, "Unauthorized"))
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
