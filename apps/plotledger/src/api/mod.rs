//! # PlotLedger HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /status` - Ledger entity counts
//! - `POST /plots` - Register a plot
//! - `GET /plots` - List plots
//! - `GET /plots/{id}` - Get a plot
//! - `POST /plots/{id}/schedule` - Create the payment schedule
//! - `GET /plots/{id}/schedule` - Schedule, installments and progress
//! - `GET /plots/{id}/progress` - Derived payment progress
//! - `GET /plots/{id}/documents` - Derived document board
//! - `POST /installments/{id}/pay` - Record a payment
//! - `POST /payments/sweep` - Run the overdue sweep
//! - `POST /documents/{id}/issue` - Attach a generated URI
//! - `POST /documents/{id}/approve` - Approve a document
//! - `GET /cases` - List legal cases
//! - `PUT /cases/{id}` - Move a case forward
//! - `GET /audit` - Recent audit entries
//! - `GET /metrics` - Prometheus metrics
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `PLOTLEDGER_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `PLOTLEDGER_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)
//! - `PLOTLEDGER_API_KEY`: If set, requires Bearer token authentication

mod auth;
mod handlers;
mod middleware;
mod types;

// Re-exports for external use
pub use auth::ApiKey;
pub use middleware::rate_limiter_from_env;
// Re-export handlers and types for integration tests (via `plotledger::api::*`)
#[allow(unused_imports)]
pub use handlers::{
    approve_document_handler, audit_handler, create_schedule_handler, document_board_handler,
    get_plot_handler, get_schedule_handler, health_handler, issue_document_handler,
    list_cases_handler, list_plots_handler, metrics_handler, pay_handler, progress_handler,
    register_plot_handler, status_handler, sweep_handler, update_case_handler,
};
#[allow(unused_imports)]
pub use types::{
    ApproveDocumentRequest, AuditResponse, CaseListResponse, CaseResponse, CreateScheduleRequest,
    DocumentBoardResponse, DocumentResponse, HealthResponse, InstallmentSpecJson,
    IssueDocumentRequest, PayRequest, PayResponse, PlotListResponse, PlotResponse,
    ProgressResponse, RegisterPlotRequest, ScheduleResponse, StatusResponse, SweepRequest,
    SweepResponse, UpdateCaseRequest,
};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post, put},
};
use plotledger_core::{LedgerError, Session};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state containing the ledger session.
#[derive(Clone)]
pub struct AppState {
    /// The session containing the ledger.
    pub session: Arc<RwLock<Session>>,
}

impl AppState {
    /// Create new app state with a session.
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self {
            session: Arc::new(RwLock::new(session)),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build CORS layer from environment configuration.
///
/// Reads `PLOTLEDGER_CORS_ORIGINS` environment variable:
/// - If "*": allows all origins (development mode - use with caution!)
/// - If not set: defaults to localhost only (restrictive default)
/// - Otherwise: parses comma-separated list of allowed origins
///
/// # Security Note
///
/// The default is restrictive (localhost only). Set `PLOTLEDGER_CORS_ORIGINS=*`
/// explicitly only for development or if you understand the security implications.
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var("PLOTLEDGER_CORS_ORIGINS").ok();

    match origins_env.as_deref() {
        Some("*") => {
            // Explicit wildcard - warn about security implications
            tracing::warn!(
                "CORS: Allowing ALL origins (PLOTLEDGER_CORS_ORIGINS=*). This is insecure for production!"
            );
            CorsLayer::permissive()
        }
        Some(origins) => {
            // Parse comma-separated origins
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in PLOTLEDGER_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            }
        }
        None => {
            // No configuration - default to localhost only (restrictive)
            tracing::info!("CORS: No PLOTLEDGER_CORS_ORIGINS set, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let localhost_origins = vec![
        "http://localhost:3000".parse::<HeaderValue>().ok(),
        "http://localhost:8080".parse::<HeaderValue>().ok(),
        "http://127.0.0.1:3000".parse::<HeaderValue>().ok(),
        "http://127.0.0.1:8080".parse::<HeaderValue>().ok(),
    ];
    let origins: Vec<HeaderValue> = localhost_origins.into_iter().flatten().collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. CORS - handles preflight requests
/// 2. Tracing - logs all requests
/// 3. Rate Limiting - protects against DoS (if enabled)
/// 4. Authentication - validates API key (if configured)
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer();

    // Whether a limiter exists at all is decided inside the middleware
    // module; 0 disables it.
    let rate_limiter = middleware::rate_limiter_from_env();

    // The API key is resolved once here and carried as middleware state.
    let api_key = auth::ApiKey::from_env();
    if api_key.is_none() {
        tracing::warn!(
            "API key authentication DISABLED - all endpoints are publicly accessible! \
             Set PLOTLEDGER_API_KEY environment variable to enable authentication."
        );
    }

    // Build base router with routes
    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route("/plots", post(handlers::register_plot_handler))
        .route("/plots", get(handlers::list_plots_handler))
        .route("/plots/{id}", get(handlers::get_plot_handler))
        .route("/plots/{id}/schedule", post(handlers::create_schedule_handler))
        .route("/plots/{id}/schedule", get(handlers::get_schedule_handler))
        .route("/plots/{id}/progress", get(handlers::progress_handler))
        .route("/plots/{id}/documents", get(handlers::document_board_handler))
        .route("/installments/{id}/pay", post(handlers::pay_handler))
        .route("/payments/sweep", post(handlers::sweep_handler))
        .route("/documents/{id}/issue", post(handlers::issue_document_handler))
        .route(
            "/documents/{id}/approve",
            post(handlers::approve_document_handler),
        )
        .route("/cases", get(handlers::list_cases_handler))
        .route("/cases/{id}", put(handlers::update_case_handler))
        .route("/audit", get(handlers::audit_handler))
        .route("/metrics", get(handlers::metrics_handler));

    // Apply authentication middleware (innermost - runs last on request)
    if let Some(key) = api_key {
        tracing::info!("API key authentication enabled");
        router = router.layer(axum_middleware::from_fn_with_state(
            key,
            auth::require_api_key,
        ));
    }

    // Apply rate limiting middleware
    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    // Apply CORS, body limit, and tracing (outermost layers)
    router
        .layer(axum::extract::DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server.
pub async fn run_server(addr: &str, session: Session) -> Result<(), LedgerError> {
    let state = AppState::new(session);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| LedgerError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("PlotLedger HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| LedgerError::IoError(format!("Server error: {}", e)))
}
