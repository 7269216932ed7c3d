//! Integration tests for the PlotLedger HTTP API.
//!
//! Uses axum-test to test the API handlers without starting a real server.

// Allow unwrap and panic in tests - these are standard for test code
// Allow holding MutexGuard across await in auth tests - tests are serialized
// intentionally to avoid env var conflicts
#![allow(clippy::unwrap_used, clippy::panic, clippy::await_holding_lock)]

use axum::http::HeaderValue;
use axum_test::TestServer;
use chrono::NaiveDate;
use plotledger::api::{
    AppState, CaseListResponse, CaseResponse, DocumentBoardResponse, DocumentResponse,
    HealthResponse, PayResponse, PlotListResponse, PlotResponse, ProgressResponse,
    ScheduleResponse, StatusResponse, SweepResponse, create_router,
};
use plotledger_core::{
    DocumentAvailability, DocumentKind, DocumentStatus, InstallmentSpec, Milestone, Money, NewPlot,
    PlotStatus, Session,
};
use serde_json::json;
use std::sync::Mutex;

/// Mutex to serialize auth tests since they modify env vars.
static AUTH_TEST_MUTEX: Mutex<()> = Mutex::new(());

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Guard wrapper that holds the mutex and ensures cleanup on drop.
struct TestGuard {
    _guard: std::sync::MutexGuard<'static, ()>,
}

impl Drop for TestGuard {
    fn drop(&mut self) {
        // SAFETY: Tests run sequentially under AUTH_TEST_MUTEX, so no concurrent env access.
        unsafe { std::env::remove_var("PLOTLEDGER_API_KEY") };
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Create a test server with a fresh in-memory session.
/// Returns a guard that must be kept alive during the test.
fn create_test_server() -> (TestServer, TestGuard) {
    let guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    // SAFETY: Tests run sequentially under AUTH_TEST_MUTEX, so no concurrent env access.
    unsafe { std::env::remove_var("PLOTLEDGER_API_KEY") };
    let session = Session::new();
    let state = AppState::new(session);
    let router = create_router(state);
    (
        TestServer::new(router).unwrap(),
        TestGuard { _guard: guard },
    )
}

/// Ids assigned while seeding the populated test server.
struct Seeded {
    plot: u64,
    installments: Vec<u64>,
}

/// Create a test server pre-populated with a scheduled plot: total 2M,
/// 200k down (installment 1, due 2024-01-01) plus four 450k installments
/// due monthly from 2024-02-01.
fn create_populated_test_server() -> (TestServer, Seeded, TestGuard) {
    let guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    // SAFETY: Tests run sequentially under AUTH_TEST_MUTEX, so no concurrent env access.
    unsafe { std::env::remove_var("PLOTLEDGER_API_KEY") };

    let mut session = Session::new();
    let plot = session
        .register_plot(
            NewPlot {
                plot_number: "HG-3-007".to_string(),
                area: "1 kanal".to_string(),
                location: "Phase 3, Block B".to_string(),
                total_value: Money::new(2_000_000),
            },
            date(2024, 1, 1),
        )
        .unwrap();

    let specs: Vec<InstallmentSpec> = (1..=4)
        .map(|n| InstallmentSpec {
            amount: Money::new(450_000),
            due_date: date(2024, n + 1, 1),
        })
        .collect();
    let (_, installments) = session
        .create_schedule(
            plot.id,
            Money::new(2_000_000),
            Money::new(200_000),
            &specs,
            date(2024, 1, 1),
        )
        .unwrap();

    let seeded = Seeded {
        plot: plot.id.0,
        installments: installments.iter().map(|i| i.id.0).collect(),
    };

    let state = AppState::new(session);
    let router = create_router(state);
    (
        TestServer::new(router).unwrap(),
        seeded,
        TestGuard { _guard: guard },
    )
}

// =============================================================================
// HEALTH ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (server, _guard) = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

#[tokio::test]
async fn test_health_returns_correct_version() {
    let (server, _guard) = create_test_server();

    let response = server.get("/health").await;
    let health: HealthResponse = response.json();

    // Version should match Cargo.toml
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

// =============================================================================
// STATUS ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_status_empty_ledger() {
    let (server, _guard) = create_test_server();

    let response = server.get("/status").await;

    response.assert_status_ok();
    let status: StatusResponse = response.json();
    assert_eq!(status.plot_count, 0);
    assert_eq!(status.schedule_count, 0);
    assert_eq!(status.document_count, 0);
    assert_eq!(status.open_case_count, 0);
}

#[tokio::test]
async fn test_status_populated_ledger() {
    let (server, _seeded, _guard) = create_populated_test_server();

    let response = server.get("/status").await;

    response.assert_status_ok();
    let status: StatusResponse = response.json();
    assert_eq!(status.plot_count, 1);
    assert_eq!(status.schedule_count, 1);
}

// =============================================================================
// PLOT ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_register_plot() {
    let (server, _guard) = create_test_server();

    let request = json!({
        "plot_number": "HG-1-001",
        "area": "10 marla",
        "location": "Phase 1",
        "total_value": 1_000_000,
        "registered_on": "2024-01-01"
    });

    let response = server.post("/plots").json(&request).await;

    response.assert_status_ok();
    let result: PlotResponse = response.json();
    assert!(result.success);
    let plot = result.plot.unwrap();
    assert_eq!(plot.plot_number, "HG-1-001");
    assert_eq!(plot.status, PlotStatus::Available);
}

#[tokio::test]
async fn test_register_plot_empty_number_rejected() {
    let (server, _guard) = create_test_server();

    let request = json!({
        "plot_number": "",
        "area": "10 marla",
        "location": "Phase 1",
        "total_value": 1_000_000
    });

    let response = server.post("/plots").json(&request).await;

    response.assert_status_bad_request();
    let result: PlotResponse = response.json();
    assert!(!result.success);
    assert!(result.error.is_some());
}

#[tokio::test]
async fn test_register_plot_non_positive_value_rejected() {
    let (server, _guard) = create_test_server();

    let request = json!({
        "plot_number": "HG-1-002",
        "area": "5 marla",
        "location": "Phase 1",
        "total_value": 0
    });

    let response = server.post("/plots").json(&request).await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_get_plot_not_found() {
    let (server, _guard) = create_test_server();

    let response = server.get("/plots/999").await;

    response.assert_status(axum::http::StatusCode::NOT_FOUND);
    let result: PlotResponse = response.json();
    assert!(!result.success);
}

#[tokio::test]
async fn test_list_plots() {
    let (server, seeded, _guard) = create_populated_test_server();

    let response = server.get("/plots").await;

    response.assert_status_ok();
    let result: PlotListResponse = response.json();
    assert!(result.success);
    assert_eq!(result.plots.len(), 1);
    assert_eq!(result.plots[0].id.0, seeded.plot);
    // Schedule creation marked the plot sold
    assert_eq!(result.plots[0].status, PlotStatus::Sold);
}

// =============================================================================
// SCHEDULE ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_create_schedule() {
    let (server, _guard) = create_test_server();

    let register = json!({
        "plot_number": "HG-2-001",
        "area": "10 marla",
        "location": "Phase 2",
        "total_value": 1_000_000,
        "registered_on": "2024-01-01"
    });
    let plot: PlotResponse = server.post("/plots").json(&register).await.json();
    let plot_id = plot.plot.unwrap().id.0;

    let request = json!({
        "total_amount": 1_000_000,
        "down_payment": 100_000,
        "installments": [
            { "amount": 400_000, "due_date": "2024-06-01" },
            { "amount": 500_000, "due_date": "2024-12-01" }
        ],
        "created_on": "2024-01-01"
    });

    let response = server
        .post(&format!("/plots/{}/schedule", plot_id))
        .json(&request)
        .await;

    response.assert_status_ok();
    let result: ScheduleResponse = response.json();
    assert!(result.success);
    let schedule = result.schedule.unwrap();
    // Down payment becomes installment 1
    assert_eq!(schedule.installment_count, 3);
    assert_eq!(result.installments.len(), 3);
    assert_eq!(result.installments[0].amount, Money::new(100_000));
    let progress = result.progress.unwrap();
    assert_eq!(progress.percentage, 0);
}

#[tokio::test]
async fn test_create_schedule_sum_mismatch_rejected() {
    let (server, _guard) = create_test_server();

    let register = json!({
        "plot_number": "HG-2-002",
        "area": "10 marla",
        "location": "Phase 2",
        "total_value": 1_000_000
    });
    let plot: PlotResponse = server.post("/plots").json(&register).await.json();
    let plot_id = plot.plot.unwrap().id.0;

    // 100k + 400k != 1M
    let request = json!({
        "total_amount": 1_000_000,
        "down_payment": 100_000,
        "installments": [{ "amount": 400_000, "due_date": "2024-06-01" }]
    });

    let response = server
        .post(&format!("/plots/{}/schedule", plot_id))
        .json(&request)
        .await;

    response.assert_status_bad_request();
    let result: ScheduleResponse = response.json();
    assert!(!result.success);
}

#[tokio::test]
async fn test_create_schedule_down_payment_only() {
    let (server, _guard) = create_test_server();

    let register = json!({
        "plot_number": "HG-2-005",
        "area": "5 marla",
        "location": "Phase 2",
        "total_value": 500_000,
        "registered_on": "2024-01-01"
    });
    let plot: PlotResponse = server.post("/plots").json(&register).await.json();
    let plot_id = plot.plot.unwrap().id.0;

    // A down payment covering the full total is a valid one-installment schedule
    let request = json!({
        "total_amount": 500_000,
        "down_payment": 500_000,
        "installments": [],
        "created_on": "2024-01-01"
    });

    let response = server
        .post(&format!("/plots/{}/schedule", plot_id))
        .json(&request)
        .await;

    response.assert_status_ok();
    let result: ScheduleResponse = response.json();
    assert!(result.success);
    assert_eq!(result.schedule.unwrap().installment_count, 1);
    assert_eq!(result.installments.len(), 1);
    assert_eq!(result.installments[0].amount, Money::new(500_000));
}

#[tokio::test]
async fn test_create_schedule_empty_without_down_rejected() {
    let (server, _guard) = create_test_server();

    let register = json!({
        "plot_number": "HG-2-006",
        "area": "5 marla",
        "location": "Phase 2",
        "total_value": 500_000
    });
    let plot: PlotResponse = server.post("/plots").json(&register).await.json();
    let plot_id = plot.plot.unwrap().id.0;

    let request = json!({
        "total_amount": 500_000,
        "down_payment": 0,
        "installments": []
    });

    let response = server
        .post(&format!("/plots/{}/schedule", plot_id))
        .json(&request)
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_create_schedule_twice_conflicts() {
    let (server, seeded, _guard) = create_populated_test_server();

    let request = json!({
        "total_amount": 2_000_000,
        "down_payment": 0,
        "installments": [{ "amount": 2_000_000, "due_date": "2024-06-01" }]
    });

    let response = server
        .post(&format!("/plots/{}/schedule", seeded.plot))
        .json(&request)
        .await;

    response.assert_status(axum::http::StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_create_schedule_unknown_plot_404() {
    let (server, _guard) = create_test_server();

    let request = json!({
        "total_amount": 1_000_000,
        "down_payment": 0,
        "installments": [{ "amount": 1_000_000, "due_date": "2024-06-01" }]
    });

    let response = server.post("/plots/999/schedule").json(&request).await;

    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_schedule_none_404() {
    let (server, _guard) = create_test_server();

    let register = json!({
        "plot_number": "HG-2-003",
        "area": "10 marla",
        "location": "Phase 2",
        "total_value": 1_000_000
    });
    let plot: PlotResponse = server.post("/plots").json(&register).await.json();
    let plot_id = plot.plot.unwrap().id.0;

    let response = server.get(&format!("/plots/{}/schedule", plot_id)).await;

    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_schedule_with_installments_and_progress() {
    let (server, seeded, _guard) = create_populated_test_server();

    let response = server.get(&format!("/plots/{}/schedule", seeded.plot)).await;

    response.assert_status_ok();
    let result: ScheduleResponse = response.json();
    assert!(result.success);
    assert_eq!(result.installments.len(), 5);
    assert_eq!(result.progress.unwrap().percentage, 0);
}

// =============================================================================
// PAYMENT ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_pay_crosses_milestone() {
    let (server, seeded, _guard) = create_populated_test_server();

    // Down payment: 200k of 2M -> 10% -> Allotment
    let response = server
        .post(&format!("/installments/{}/pay", seeded.installments[0]))
        .json(&json!({ "paid_on": "2024-01-01" }))
        .await;

    response.assert_status_ok();
    let result: PayResponse = response.json();
    assert!(result.success);
    assert_eq!(result.milestone_reached, Some(Milestone::Allotment));
    let progress = result.progress.unwrap();
    assert_eq!(progress.percentage, 10);
    assert_eq!(progress.milestone, Milestone::Allotment);
}

#[tokio::test]
async fn test_pay_twice_rejected() {
    let (server, seeded, _guard) = create_populated_test_server();

    let first = server
        .post(&format!("/installments/{}/pay", seeded.installments[0]))
        .json(&json!({ "paid_on": "2024-01-01" }))
        .await;
    first.assert_status_ok();

    let second = server
        .post(&format!("/installments/{}/pay", seeded.installments[0]))
        .json(&json!({ "paid_on": "2024-01-02" }))
        .await;

    second.assert_status_bad_request();
    let result: PayResponse = second.json();
    assert!(!result.success);
}

#[tokio::test]
async fn test_pay_unknown_installment_404() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/installments/999/pay")
        .json(&json!({}))
        .await;

    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

// =============================================================================
// PROGRESS ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_progress_unknown_plot_404() {
    let (server, _guard) = create_test_server();

    let response = server.get("/plots/999/progress").await;

    response.assert_status(axum::http::StatusCode::NOT_FOUND);
    let result: ProgressResponse = response.json();
    assert!(!result.success);
}

#[tokio::test]
async fn test_progress_accumulates() {
    let (server, seeded, _guard) = create_populated_test_server();

    for (index, paid_on) in [(0, "2024-01-01"), (1, "2024-02-01"), (2, "2024-03-01")] {
        server
            .post(&format!("/installments/{}/pay", seeded.installments[index]))
            .json(&json!({ "paid_on": paid_on }))
            .await
            .assert_status_ok();
    }

    let response = server.get(&format!("/plots/{}/progress", seeded.plot)).await;

    response.assert_status_ok();
    let result: ProgressResponse = response.json();
    assert!(result.success);
    // 200k + 450k + 450k = 1.1M of 2M -> 55%
    assert_eq!(result.percentage, 55);
    assert_eq!(result.milestone, Milestone::Allocation);
    assert_eq!(result.milestone_level, 50);
    assert_eq!(result.total_paid, 1_100_000);
}

// =============================================================================
// DOCUMENT ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_document_board_always_four_slots() {
    let (server, seeded, _guard) = create_populated_test_server();

    let response = server
        .get(&format!("/plots/{}/documents", seeded.plot))
        .await;

    response.assert_status_ok();
    let result: DocumentBoardResponse = response.json();
    assert!(result.success);
    assert_eq!(result.reached, Milestone::None);
    assert_eq!(result.slots.len(), 4);
    for slot in &result.slots {
        assert_eq!(slot.availability, DocumentAvailability::Locked);
    }
}

#[tokio::test]
async fn test_document_issue_and_approve_flow() {
    let (server, seeded, _guard) = create_populated_test_server();

    // Reach 10% so the Allotment document slot is created
    server
        .post(&format!("/installments/{}/pay", seeded.installments[0]))
        .json(&json!({ "paid_on": "2024-01-01" }))
        .await
        .assert_status_ok();

    let board: DocumentBoardResponse = server
        .get(&format!("/plots/{}/documents", seeded.plot))
        .await
        .json();
    let slot = board
        .slots
        .iter()
        .find(|s| s.kind == DocumentKind::Allotment)
        .unwrap();
    assert_eq!(slot.availability, DocumentAvailability::Pending);
    let document_id = slot.document.as_ref().unwrap().id.0;

    // Approving before issuing is an invalid transition
    let premature = server
        .post(&format!("/documents/{}/approve", document_id))
        .json(&json!({ "approved_by": "registrar" }))
        .await;
    premature.assert_status_bad_request();

    let issued = server
        .post(&format!("/documents/{}/issue", document_id))
        .json(&json!({ "uri": "s3://docs/allotment-7.pdf", "issued_on": "2024-01-02" }))
        .await;
    issued.assert_status_ok();
    let issued: DocumentResponse = issued.json();
    assert_eq!(issued.document.unwrap().status, DocumentStatus::Generated);

    // A URI now makes the slot Available
    let board: DocumentBoardResponse = server
        .get(&format!("/plots/{}/documents", seeded.plot))
        .await
        .json();
    let slot = board
        .slots
        .iter()
        .find(|s| s.kind == DocumentKind::Allotment)
        .unwrap();
    assert_eq!(slot.availability, DocumentAvailability::Available);

    let approved = server
        .post(&format!("/documents/{}/approve", document_id))
        .json(&json!({ "approved_by": "registrar", "approved_on": "2024-01-03" }))
        .await;
    approved.assert_status_ok();
    let approved: DocumentResponse = approved.json();
    assert_eq!(approved.document.unwrap().status, DocumentStatus::Approved);
}

// =============================================================================
// SWEEP & CASE ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_sweep_opens_cases_and_freezes_plot() {
    let (server, seeded, _guard) = create_populated_test_server();

    // Every installment is past its grace period by mid-2024
    let response = server
        .post("/payments/sweep")
        .json(&json!({ "today": "2024-07-15" }))
        .await;

    response.assert_status_ok();
    let result: SweepResponse = response.json();
    assert!(result.success);
    assert_eq!(result.cases_opened, 5);

    let plot: PlotResponse = server.get(&format!("/plots/{}", seeded.plot)).await.json();
    assert_eq!(plot.plot.unwrap().status, PlotStatus::OnHold);
}

#[tokio::test]
async fn test_sweep_marks_overdue_within_grace() {
    let (server, _seeded, _guard) = create_populated_test_server();

    // 2024-01-15: only the down payment (due 2024-01-01) is overdue,
    // and its grace period has not elapsed
    let response = server
        .post("/payments/sweep")
        .json(&json!({ "today": "2024-01-15" }))
        .await;

    response.assert_status_ok();
    let result: SweepResponse = response.json();
    assert_eq!(result.marked_overdue, 1);
    assert_eq!(result.cases_opened, 0);
}

#[tokio::test]
async fn test_case_transition() {
    let (server, _seeded, _guard) = create_populated_test_server();

    server
        .post("/payments/sweep")
        .json(&json!({ "today": "2024-07-15" }))
        .await
        .assert_status_ok();

    let cases: CaseListResponse = server.get("/cases").await.json();
    assert!(!cases.cases.is_empty());
    let case_id = cases.cases[0].id.0;

    // Recorded -> InProgress skips Filed and is rejected
    let invalid = server
        .put(&format!("/cases/{}", case_id))
        .json(&json!({ "status": "in_progress" }))
        .await;
    invalid.assert_status_bad_request();

    let filed = server
        .put(&format!("/cases/{}", case_id))
        .json(&json!({
            "status": "filed",
            "filed_by": "legal office",
            "updated_on": "2024-07-20"
        }))
        .await;

    filed.assert_status_ok();
    let result: CaseResponse = filed.json();
    assert!(result.success);
    assert_eq!(result.case.unwrap().status.as_str(), "filed");
}

#[tokio::test]
async fn test_update_unknown_case_404() {
    let (server, _guard) = create_test_server();

    let response = server
        .put("/cases/999")
        .json(&json!({ "status": "filed" }))
        .await;

    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

// =============================================================================
// AUDIT ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_audit_newest_first_with_limit() {
    let (server, seeded, _guard) = create_populated_test_server();

    server
        .post(&format!("/installments/{}/pay", seeded.installments[0]))
        .json(&json!({ "paid_on": "2024-01-01" }))
        .await
        .assert_status_ok();

    let response = server.get("/audit?limit=2").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    let first = entries[0]["seq"].as_u64().unwrap();
    let second = entries[1]["seq"].as_u64().unwrap();
    assert!(first > second, "Audit must be newest first");
}

// =============================================================================
// REQUEST SHAPE TESTS
// =============================================================================

#[tokio::test]
async fn test_invalid_json_body_rejected() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/plots")
        .bytes(bytes::Bytes::from("not valid json"))
        .content_type("application/json")
        .await;

    // Should return 4xx error for invalid JSON
    assert!(response.status_code().is_client_error());
}

#[tokio::test]
async fn test_method_not_allowed() {
    let (server, _guard) = create_test_server();

    // /health is GET only
    let response = server.post("/health").await;
    assert_eq!(response.status_code().as_u16(), 405);
}

// =============================================================================
// METRICS ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_metrics_content_type() {
    let (server, _guard) = create_test_server();

    let response = server.get("/metrics").await;

    response.assert_status_ok();
    let content_type = response
        .headers()
        .get("content-type")
        .expect("content-type header must be present")
        .to_str()
        .expect("content-type must be valid utf8");
    assert_eq!(
        content_type, "text/plain; version=0.0.4",
        "Prometheus endpoint must return correct Content-Type"
    );
}

#[tokio::test]
async fn test_metrics_contains_labels() {
    let (server, _seeded, _guard) = create_populated_test_server();

    let response = server.get("/metrics").await;

    response.assert_status_ok();
    let body = response.text();
    assert!(
        body.contains("plotledger_plot_count 1"),
        "Metrics must contain plotledger_plot_count"
    );
    assert!(
        body.contains("plotledger_schedule_count 1"),
        "Metrics must contain plotledger_schedule_count"
    );
    assert!(
        body.contains("plotledger_open_case_count 0"),
        "Metrics must contain plotledger_open_case_count"
    );
    assert!(
        body.contains("# TYPE"),
        "Metrics must contain Prometheus TYPE annotations"
    );
}

// =============================================================================
// AUTHENTICATION TESTS
// =============================================================================

/// Create a test server with API key authentication enabled.
/// The caller must hold AUTH_TEST_MUTEX.
fn create_auth_test_server(api_key: &str) -> TestServer {
    // SAFETY: Caller holds AUTH_TEST_MUTEX, so no concurrent env access.
    unsafe { std::env::set_var("PLOTLEDGER_API_KEY", api_key) };
    let state = AppState::new(Session::new());
    let router = create_router(state);
    TestServer::new(router).unwrap()
}

fn cleanup_auth_env() {
    // SAFETY: Caller holds AUTH_TEST_MUTEX, so no concurrent env access.
    unsafe { std::env::remove_var("PLOTLEDGER_API_KEY") };
}

#[tokio::test]
async fn test_auth_valid_token_accepted() {
    let _guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let api_key = "secret-test-key";
    let server = create_auth_test_server(api_key);

    let response = server
        .get("/status")
        .add_header(
            axum::http::header::AUTHORIZATION,
            format!("Bearer {}", api_key).parse::<HeaderValue>().unwrap(),
        )
        .await;

    cleanup_auth_env();

    response.assert_status_ok();
}

#[tokio::test]
async fn test_auth_invalid_token_rejected() {
    let _guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let server = create_auth_test_server("correct-key");

    let response = server
        .get("/status")
        .add_header(
            axum::http::header::AUTHORIZATION,
            "Bearer wrong-key".parse::<HeaderValue>().unwrap(),
        )
        .await;

    cleanup_auth_env();

    assert_eq!(
        response.status_code().as_u16(),
        401,
        "Invalid token should return 401 Unauthorized"
    );
}

#[tokio::test]
async fn test_auth_missing_header_rejected() {
    let _guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let server = create_auth_test_server("required-key");

    // Request without Authorization header
    let response = server.get("/status").await;

    cleanup_auth_env();

    assert_eq!(
        response.status_code().as_u16(),
        401,
        "Missing Authorization header should return 401 Unauthorized"
    );
}

#[tokio::test]
async fn test_auth_health_endpoint_bypasses_auth() {
    let _guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let server = create_auth_test_server("secret-key-for-bypass-test");

    // /health should be accessible without authentication
    let response = server.get("/health").await;

    cleanup_auth_env();

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
}
