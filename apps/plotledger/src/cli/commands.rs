//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::api;
use crate::config::ServerConfig;
use chrono::{NaiveDate, Utc};
use plotledger_core::{
    InstallmentId, InstallmentSpec, LedgerError, Money, NewPlot, PlotId, Session,
    limits::{MAX_AUDIT_QUERY, MAX_INSTALLMENTS},
};
use std::path::{Path, PathBuf};

/// The current date, used when a command omits one.
fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Parse an installment argument of the form "amount:YYYY-MM-DD".
fn parse_installment_spec(raw: &str) -> Result<InstallmentSpec, LedgerError> {
    let (amount_str, date_str) = raw.split_once(':').ok_or_else(|| {
        LedgerError::InvalidSchedule(format!(
            "Installment '{}' must be of the form amount:YYYY-MM-DD",
            raw
        ))
    })?;

    let amount: i64 = amount_str.trim().parse().map_err(|_| {
        LedgerError::InvalidSchedule(format!("Invalid installment amount '{}'", amount_str))
    })?;
    let due_date: NaiveDate = date_str.trim().parse().map_err(|_| {
        LedgerError::InvalidSchedule(format!("Invalid installment due date '{}'", date_str))
    })?;

    Ok(InstallmentSpec {
        amount: Money::new(amount),
        due_date,
    })
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(
    db_path: &PathBuf,
    backend: &str,
    host: &str,
    port: u16,
    config_path: Option<&Path>,
) -> Result<(), LedgerError> {
    // Config file values override the CLI defaults
    let config = match config_path {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    let host = config.host.unwrap_or_else(|| host.to_string());
    let port = config.port.unwrap_or(port);
    let db_path = config.database.unwrap_or_else(|| db_path.clone());

    let session = load_or_create_session(&db_path, backend)?;

    println!("PlotLedger Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", host);
    println!("  Port:     {}", port);
    println!("  Backend:  {}", backend);
    println!("  Database: {:?}", db_path);
    println!();
    println!("Endpoints:");
    println!("  POST /plots                  - Register a plot");
    println!("  POST /plots/{{id}}/schedule    - Create a payment schedule");
    println!("  POST /installments/{{id}}/pay  - Record a payment");
    println!("  POST /payments/sweep         - Run the overdue sweep");
    println!("  GET  /plots/{{id}}/progress    - Derived payment progress");
    println!("  GET  /plots/{{id}}/documents   - Derived document board");
    println!("  GET  /cases                  - List legal cases");
    println!("  GET  /audit                  - Audit trail");
    println!("  GET  /health                 - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, session).await
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show ledger status.
pub fn cmd_status(db_path: &PathBuf, backend: &str, json_mode: bool) -> Result<(), LedgerError> {
    let session = load_or_create_session(db_path, backend)?;

    if json_mode {
        let output = serde_json::json!({
            "database": db_path.to_string_lossy(),
            "backend": backend,
            "plot_count": session.plot_count(),
            "schedule_count": session.schedule_count(),
            "document_count": session.document_count(),
            "open_case_count": session.open_case_count()
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("PlotLedger Status");
    println!("=================");
    println!("Database: {:?}", db_path);
    println!("Backend:  {}", backend);
    println!();
    println!("Plots:      {}", session.plot_count());
    println!("Schedules:  {}", session.schedule_count());
    println!("Documents:  {}", session.document_count());
    println!("Open Cases: {}", session.open_case_count());

    Ok(())
}

// =============================================================================
// REGISTER-PLOT COMMAND
// =============================================================================

/// Register a new plot.
#[allow(clippy::too_many_arguments)]
pub fn cmd_register_plot(
    db_path: &PathBuf,
    backend: &str,
    json_mode: bool,
    number: &str,
    area: &str,
    location: &str,
    value: i64,
    date: Option<NaiveDate>,
) -> Result<(), LedgerError> {
    let mut session = load_or_create_session(db_path, backend)?;

    let plot = session.register_plot(
        NewPlot {
            plot_number: number.to_string(),
            area: area.to_string(),
            location: location.to_string(),
            total_value: Money::new(value),
        },
        date.unwrap_or_else(today),
    )?;

    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&plot).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Registered plot {} (id {})", plot.plot_number, plot.id.0);
    println!("  Area:     {}", plot.area);
    println!("  Location: {}", plot.location);
    println!("  Value:    {}", plot.total_value);
    println!("  Status:   {}", plot.status.as_str());

    Ok(())
}

// =============================================================================
// SCHEDULE COMMAND
// =============================================================================

/// Create a plot's payment schedule.
#[allow(clippy::too_many_arguments)]
pub fn cmd_schedule(
    db_path: &PathBuf,
    backend: &str,
    json_mode: bool,
    plot: u64,
    total: i64,
    down: i64,
    installments: &[String],
    date: Option<NaiveDate>,
) -> Result<(), LedgerError> {
    if installments.is_empty() {
        return Err(LedgerError::InvalidSchedule(
            "At least one --installment amount:YYYY-MM-DD is required".to_string(),
        ));
    }
    if installments.len() > MAX_INSTALLMENTS {
        return Err(LedgerError::InvalidSchedule(format!(
            "Installment count {} exceeds maximum {}",
            installments.len(),
            MAX_INSTALLMENTS
        )));
    }

    let specs: Vec<InstallmentSpec> = installments
        .iter()
        .map(|raw| parse_installment_spec(raw))
        .collect::<Result<_, _>>()?;

    let mut session = load_or_create_session(db_path, backend)?;
    let (schedule, created) = session.create_schedule(
        PlotId(plot),
        Money::new(total),
        Money::new(down),
        &specs,
        date.unwrap_or_else(today),
    )?;

    if json_mode {
        let output = serde_json::json!({
            "schedule": schedule,
            "installments": created
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!(
        "Created schedule {} for plot {}: {} in {} installments",
        schedule.id.0, plot, schedule.total_amount, schedule.installment_count
    );
    for installment in &created {
        println!(
            "  #{:<3} {:>14}  due {}  (id {})",
            installment.number, installment.amount, installment.due_date, installment.id.0
        );
    }

    Ok(())
}

// =============================================================================
// PAY COMMAND
// =============================================================================

/// Record a payment against an installment.
pub fn cmd_pay(
    db_path: &PathBuf,
    backend: &str,
    json_mode: bool,
    installment: u64,
    date: Option<NaiveDate>,
    receipt: Option<String>,
) -> Result<(), LedgerError> {
    let mut session = load_or_create_session(db_path, backend)?;

    let outcome = session.record_payment(
        InstallmentId(installment),
        date.unwrap_or_else(today),
        receipt,
    )?;

    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&outcome).unwrap_or_default()
        );
        return Ok(());
    }

    println!(
        "Recorded payment of {} for installment #{}",
        outcome.installment.amount, outcome.installment.number
    );
    println!(
        "  Progress: {}% ({})",
        outcome.progress.percentage,
        outcome.progress.milestone.name()
    );
    if let Some(milestone) = outcome.milestone_reached {
        println!("  Milestone reached: {}", milestone);
    }

    Ok(())
}

// =============================================================================
// PROGRESS COMMAND
// =============================================================================

/// Show a plot's derived payment progress.
pub fn cmd_progress(
    db_path: &PathBuf,
    backend: &str,
    json_mode: bool,
    plot: u64,
) -> Result<(), LedgerError> {
    let session = load_or_create_session(db_path, backend)?;
    let progress = session.progress(PlotId(plot))?;

    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&progress).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Payment Progress for Plot {}", plot);
    println!("===========================");
    println!("Paid:       {} of {}", progress.total_paid, progress.total_due);
    println!("Percentage: {}%", progress.percentage);
    println!("Milestone:  {}", progress.milestone);

    Ok(())
}

// =============================================================================
// DOCUMENTS COMMAND
// =============================================================================

/// Show a plot's document board.
pub fn cmd_documents(
    db_path: &PathBuf,
    backend: &str,
    json_mode: bool,
    plot: u64,
) -> Result<(), LedgerError> {
    let session = load_or_create_session(db_path, backend)?;
    let board = session.document_board(PlotId(plot))?;

    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&board).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Document Board for Plot {}", plot);
    println!("=========================");
    for slot in &board {
        let detail = match &slot.document {
            Some(doc) => format!(
                "{}{}",
                doc.status.as_str(),
                doc.generated_uri
                    .as_deref()
                    .map(|uri| format!(", {}", uri))
                    .unwrap_or_default()
            ),
            None => "no record".to_string(),
        };
        println!(
            "  {:<22} {:>3}%  {:<9} ({})",
            slot.kind.label(),
            slot.required_level,
            slot.availability.as_str(),
            detail
        );
    }

    Ok(())
}

// =============================================================================
// SWEEP COMMAND
// =============================================================================

/// Run the overdue sweep.
pub fn cmd_sweep(
    db_path: &PathBuf,
    backend: &str,
    json_mode: bool,
    date: Option<NaiveDate>,
) -> Result<(), LedgerError> {
    let reference = date.unwrap_or_else(today);
    let mut session = load_or_create_session(db_path, backend)?;
    let outcome = session.sweep_overdue(reference)?;

    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&outcome).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Sweep as of {}", reference);
    println!("  Marked overdue: {}", outcome.marked_overdue.len());
    println!("  Cases opened:   {}", outcome.cases_opened.len());

    Ok(())
}

// =============================================================================
// CASES COMMAND
// =============================================================================

/// List legal cases.
pub fn cmd_cases(db_path: &PathBuf, backend: &str, json_mode: bool) -> Result<(), LedgerError> {
    let session = load_or_create_session(db_path, backend)?;
    let cases = session.cases()?;

    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&cases).unwrap_or_default()
        );
        return Ok(());
    }

    if cases.is_empty() {
        println!("No legal cases.");
        return Ok(());
    }

    println!("Legal Cases");
    println!("===========");
    for case in &cases {
        println!(
            "  #{:<4} plot {:<4} {:>14}  {:<12} opened {}",
            case.id.0,
            case.plot_id.0,
            case.amount,
            case.status.as_str(),
            case.opened_on
        );
    }

    Ok(())
}

// =============================================================================
// AUDIT COMMAND
// =============================================================================

/// Show recent audit entries, newest first.
pub fn cmd_audit(
    db_path: &PathBuf,
    backend: &str,
    json_mode: bool,
    limit: usize,
) -> Result<(), LedgerError> {
    let session = load_or_create_session(db_path, backend)?;
    let entries = session.audit(limit.min(MAX_AUDIT_QUERY))?;

    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&entries).unwrap_or_default()
        );
        return Ok(());
    }

    if entries.is_empty() {
        println!("Audit trail is empty.");
        return Ok(());
    }

    println!("Audit Trail (newest first)");
    println!("==========================");
    for entry in &entries {
        let plot = entry
            .plot
            .map(|p| format!("plot {}", p.0))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  #{:<5} {}  {:<22} {:<9} {}",
            entry.seq,
            entry.on,
            entry.action.as_str(),
            plot,
            entry.detail
        );
    }

    Ok(())
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize new database.
pub fn cmd_init(db_path: &PathBuf, backend: &str, force: bool) -> Result<(), LedgerError> {
    if db_path.exists() && !force {
        return Err(LedgerError::IoError(
            "Database already exists. Use --force to overwrite.".to_string(),
        ));
    }

    match backend {
        "redb" => {
            if db_path.exists() {
                std::fs::remove_file(db_path).map_err(|e| {
                    LedgerError::IoError(format!("Cannot remove existing database: {}", e))
                })?;
            }
            let _session = Session::with_redb(db_path)?;
            println!("Initialized new redb database at {:?}", db_path);
        }
        "memory" => {
            println!("Memory backend needs no initialization.");
        }
        other => {
            return Err(LedgerError::IoError(format!(
                "Unknown backend: {}. Use: redb, memory",
                other
            )));
        }
    }

    Ok(())
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Load or create a session from a database path with specified backend.
pub fn load_or_create_session(db_path: &Path, backend: &str) -> Result<Session, LedgerError> {
    match backend {
        "redb" => Session::with_redb(db_path),
        "memory" => {
            tracing::warn!("Memory backend is volatile; changes are not persisted");
            Ok(Session::new())
        }
        other => Err(LedgerError::IoError(format!(
            "Unknown backend: {}. Use: redb, memory",
            other
        ))),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn parse_installment_spec_accepts_amount_and_date() {
        let spec = parse_installment_spec("450000:2024-03-01").expect("parse");
        assert_eq!(spec.amount, Money::new(450_000));
        assert_eq!(
            spec.due_date,
            NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date")
        );
    }

    #[test]
    fn parse_installment_spec_trims_whitespace() {
        let spec = parse_installment_spec(" 100 : 2025-01-15 ").expect("parse");
        assert_eq!(spec.amount, Money::new(100));
    }

    #[test]
    fn parse_installment_spec_rejects_bad_input() {
        assert!(parse_installment_spec("no-colon").is_err());
        assert!(parse_installment_spec("abc:2024-01-01").is_err());
        assert!(parse_installment_spec("100:not-a-date").is_err());
    }

    #[test]
    fn unknown_backend_rejected() {
        let err = load_or_create_session(Path::new("x.db"), "postgres");
        assert!(matches!(err, Err(LedgerError::IoError(_))));
    }
}
