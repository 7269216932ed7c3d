//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.
//!
//! Handlers are thin: they validate the request shape, take the session
//! lock, call into the Core and translate `LedgerError` into an HTTP
//! status. Dates omitted by the client default to the server's current
//! date; the Core itself never reads a clock.

use super::{
    AppState,
    types::{
        ApproveDocumentRequest, AuditResponse, CaseListResponse, CaseResponse,
        CreateScheduleRequest, DocumentBoardResponse, DocumentResponse, HealthResponse,
        IssueDocumentRequest, PayRequest, PayResponse, PlotListResponse, PlotResponse,
        ProgressResponse, RegisterPlotRequest, ScheduleResponse, StatusResponse, SweepRequest,
        SweepResponse, UpdateCaseRequest,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::{NaiveDate, Utc};
use plotledger_core::{
    CaseId, DocumentId, InstallmentId, LedgerError, Money, PlotId, limits::MAX_AUDIT_QUERY,
};
use serde::Deserialize;

/// The server's current date, used when a request omits one.
fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Map a ledger error to an HTTP status code.
fn error_status(error: &LedgerError) -> StatusCode {
    match error {
        LedgerError::PlotNotFound(_)
        | LedgerError::ScheduleNotFound(_)
        | LedgerError::InstallmentNotFound(_)
        | LedgerError::DocumentNotFound(_)
        | LedgerError::CaseNotFound(_) => StatusCode::NOT_FOUND,
        LedgerError::ScheduleExists(_) => StatusCode::CONFLICT,
        LedgerError::InvalidSchedule(_)
        | LedgerError::InvalidPayment(_)
        | LedgerError::InvalidTransition(_) => StatusCode::BAD_REQUEST,
        LedgerError::SerializationError(_) | LedgerError::IoError(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// STATUS HANDLER
// =============================================================================

/// Get ledger entity counts.
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.read().await;

    let response = StatusResponse {
        plot_count: session.plot_count(),
        schedule_count: session.schedule_count(),
        document_count: session.document_count(),
        open_case_count: session.open_case_count(),
    };

    (StatusCode::OK, Json(response))
}

// =============================================================================
// PLOT HANDLERS
// =============================================================================

/// Register a new plot.
pub async fn register_plot_handler(
    State(state): State<AppState>,
    Json(request): Json<RegisterPlotRequest>,
) -> impl IntoResponse {
    let new_plot = match request.to_new_plot() {
        Ok(p) => p,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(PlotResponse::error(format!("Invalid plot: {}", e))),
            );
        }
    };
    let on = request.registered_on.unwrap_or_else(today);

    let mut session = state.session.write().await;
    match session.register_plot(new_plot, on) {
        Ok(plot) => (StatusCode::OK, Json(PlotResponse::success(plot))),
        Err(e) => (
            error_status(&e),
            Json(PlotResponse::error(format!("Registration failed: {}", e))),
        ),
    }
}

/// List all plots.
pub async fn list_plots_handler(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.read().await;
    match session.plots() {
        Ok(plots) => (StatusCode::OK, Json(PlotListResponse::success(plots))),
        Err(e) => (
            error_status(&e),
            Json(PlotListResponse::error(format!("Listing failed: {}", e))),
        ),
    }
}

/// Get a single plot.
pub async fn get_plot_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> impl IntoResponse {
    let session = state.session.read().await;
    match session.plot(PlotId(id)) {
        Ok(Some(plot)) => (StatusCode::OK, Json(PlotResponse::success(plot))),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(PlotResponse::error(format!("Plot not found: {}", id))),
        ),
        Err(e) => (
            error_status(&e),
            Json(PlotResponse::error(format!("Lookup failed: {}", e))),
        ),
    }
}

// =============================================================================
// SCHEDULE HANDLERS
// =============================================================================

/// Create the payment schedule for a plot.
pub async fn create_schedule_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<CreateScheduleRequest>,
) -> impl IntoResponse {
    let specs = match request.to_specs() {
        Ok(s) => s,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ScheduleResponse::error(format!("Invalid schedule: {}", e))),
            );
        }
    };
    let on = request.created_on.unwrap_or_else(today);
    let plot_id = PlotId(id);

    let mut session = state.session.write().await;
    let created = session.create_schedule(
        plot_id,
        Money::new(request.total_amount),
        Money::new(request.down_payment),
        &specs,
        on,
    );
    match created {
        Ok((schedule, installments)) => match session.progress(plot_id) {
            Ok(progress) => (
                StatusCode::OK,
                Json(ScheduleResponse::success(schedule, installments, progress)),
            ),
            Err(e) => (
                error_status(&e),
                Json(ScheduleResponse::error(format!("Progress failed: {}", e))),
            ),
        },
        Err(e) => (
            error_status(&e),
            Json(ScheduleResponse::error(format!(
                "Schedule creation failed: {}",
                e
            ))),
        ),
    }
}

/// Get a plot's schedule, installments and derived progress.
pub async fn get_schedule_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> impl IntoResponse {
    let plot_id = PlotId(id);
    let session = state.session.read().await;

    let schedule = match session.schedule_for_plot(plot_id) {
        Ok(Some(s)) => s,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ScheduleResponse::error(format!(
                    "Plot {} has no payment schedule",
                    id
                ))),
            );
        }
        Err(e) => {
            return (
                error_status(&e),
                Json(ScheduleResponse::error(format!("Lookup failed: {}", e))),
            );
        }
    };

    let installments = match session.installments(schedule.id) {
        Ok(i) => i,
        Err(e) => {
            return (
                error_status(&e),
                Json(ScheduleResponse::error(format!("Lookup failed: {}", e))),
            );
        }
    };

    match session.progress(plot_id) {
        Ok(progress) => (
            StatusCode::OK,
            Json(ScheduleResponse::success(schedule, installments, progress)),
        ),
        Err(e) => (
            error_status(&e),
            Json(ScheduleResponse::error(format!("Progress failed: {}", e))),
        ),
    }
}

// =============================================================================
// PROGRESS HANDLER
// =============================================================================

/// Derive a plot's payment progress.
pub async fn progress_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> impl IntoResponse {
    let session = state.session.read().await;
    match session.progress(PlotId(id)) {
        Ok(progress) => (StatusCode::OK, Json(ProgressResponse::success(&progress))),
        Err(e) => (
            error_status(&e),
            Json(ProgressResponse::error(format!("Progress failed: {}", e))),
        ),
    }
}

// =============================================================================
// DOCUMENT HANDLERS
// =============================================================================

/// Derive a plot's four-slot document board.
pub async fn document_board_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> impl IntoResponse {
    let plot_id = PlotId(id);
    let session = state.session.read().await;

    let progress = match session.progress(plot_id) {
        Ok(p) => p,
        Err(e) => {
            return (
                error_status(&e),
                Json(DocumentBoardResponse::error(format!(
                    "Progress failed: {}",
                    e
                ))),
            );
        }
    };

    match session.document_board(plot_id) {
        Ok(slots) => (
            StatusCode::OK,
            Json(DocumentBoardResponse::success(progress.milestone, slots)),
        ),
        Err(e) => (
            error_status(&e),
            Json(DocumentBoardResponse::error(format!("Board failed: {}", e))),
        ),
    }
}

/// Attach a generated URI to a Ready document.
pub async fn issue_document_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<IssueDocumentRequest>,
) -> impl IntoResponse {
    let on = request.issued_on.unwrap_or_else(today);

    let mut session = state.session.write().await;
    match session.issue_document(DocumentId(id), request.uri, on) {
        Ok(document) => (StatusCode::OK, Json(DocumentResponse::success(document))),
        Err(e) => (
            error_status(&e),
            Json(DocumentResponse::error(format!("Issuance failed: {}", e))),
        ),
    }
}

/// Approve a Generated document.
pub async fn approve_document_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<ApproveDocumentRequest>,
) -> impl IntoResponse {
    let on = request.approved_on.unwrap_or_else(today);

    let mut session = state.session.write().await;
    match session.approve_document(DocumentId(id), request.approved_by, on) {
        Ok(document) => (StatusCode::OK, Json(DocumentResponse::success(document))),
        Err(e) => (
            error_status(&e),
            Json(DocumentResponse::error(format!("Approval failed: {}", e))),
        ),
    }
}

// =============================================================================
// PAYMENT HANDLERS
// =============================================================================

/// Record a payment against an installment.
pub async fn pay_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<PayRequest>,
) -> impl IntoResponse {
    let receipt_uri = match request.validated_uri() {
        Ok(uri) => uri,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(PayResponse::error(format!("Invalid payment: {}", e))),
            );
        }
    };
    let paid_on = request.paid_on.unwrap_or_else(today);

    let mut session = state.session.write().await;
    match session.record_payment(InstallmentId(id), paid_on, receipt_uri) {
        Ok(outcome) => (StatusCode::OK, Json(PayResponse::success(outcome))),
        Err(e) => (
            error_status(&e),
            Json(PayResponse::error(format!("Payment failed: {}", e))),
        ),
    }
}

/// Run the overdue sweep across every schedule.
pub async fn sweep_handler(
    State(state): State<AppState>,
    Json(request): Json<SweepRequest>,
) -> impl IntoResponse {
    let reference = request.today.unwrap_or_else(today);

    let mut session = state.session.write().await;
    match session.sweep_overdue(reference) {
        Ok(outcome) => (StatusCode::OK, Json(SweepResponse::success(&outcome))),
        Err(e) => (
            error_status(&e),
            Json(SweepResponse::error(format!("Sweep failed: {}", e))),
        ),
    }
}

// =============================================================================
// CASE HANDLERS
// =============================================================================

/// List all legal cases.
pub async fn list_cases_handler(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.read().await;
    match session.cases() {
        Ok(cases) => (StatusCode::OK, Json(CaseListResponse::success(cases))),
        Err(e) => (
            error_status(&e),
            Json(CaseListResponse::error(format!("Listing failed: {}", e))),
        ),
    }
}

/// Move a case to a new status.
pub async fn update_case_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<UpdateCaseRequest>,
) -> impl IntoResponse {
    let on = request.updated_on.unwrap_or_else(today);

    let mut session = state.session.write().await;
    match session.update_case(
        CaseId(id),
        request.status,
        request.court_date,
        request.filed_by,
        on,
    ) {
        Ok(case) => (StatusCode::OK, Json(CaseResponse::success(case))),
        Err(e) => (
            error_status(&e),
            Json(CaseResponse::error(format!("Transition failed: {}", e))),
        ),
    }
}

// =============================================================================
// AUDIT HANDLER
// =============================================================================

/// Query parameters for the audit endpoint.
#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    pub limit: Option<usize>,
}

/// Get the most recent audit entries, newest first.
pub async fn audit_handler(
    State(state): State<AppState>,
    Query(query): Query<AuditQuery>,
) -> impl IntoResponse {
    let limit = query.limit.unwrap_or(100).min(MAX_AUDIT_QUERY);

    let session = state.session.read().await;
    match session.audit(limit) {
        Ok(entries) => (StatusCode::OK, Json(AuditResponse::success(entries))),
        Err(e) => (
            error_status(&e),
            Json(AuditResponse::error(format!("Audit failed: {}", e))),
        ),
    }
}

// =============================================================================
// METRICS HANDLER
// =============================================================================

/// Prometheus metrics endpoint, hand-rendered text exposition format.
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.read().await;

    let body = format!(
        "# HELP plotledger_plot_count Number of registered plots.\n\
         # TYPE plotledger_plot_count gauge\n\
         plotledger_plot_count {}\n\
         # HELP plotledger_schedule_count Number of payment schedules.\n\
         # TYPE plotledger_schedule_count gauge\n\
         plotledger_schedule_count {}\n\
         # HELP plotledger_document_count Number of milestone documents.\n\
         # TYPE plotledger_document_count gauge\n\
         plotledger_document_count {}\n\
         # HELP plotledger_open_case_count Number of open legal cases.\n\
         # TYPE plotledger_open_case_count gauge\n\
         plotledger_open_case_count {}\n",
        session.plot_count(),
        session.schedule_count(),
        session.document_count(),
        session.open_case_count(),
    );

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
}
