//! # Session Module
//!
//! The high-level entry point combining a storage backend with the
//! operations layer.
//!
//! ## Storage Backends
//!
//! Session supports two storage backends:
//! - `InMemory`: Uses the in-memory `Ledger` (fast, volatile)
//! - `Persistent`: Uses `RedbLedger` for disk-backed ACID storage
//!
//! Derived reads (progress, document board) are recomputed from stored
//! records on every call; the session never caches a milestone.

use crate::audit::AuditEntry;
use crate::documents::DocumentSlot;
use crate::ledger::{Ledger, LedgerStore};
use crate::milestone::PaymentProgress;
use crate::ops::{InstallmentSpec, Operations, PaymentOutcome, SweepOutcome};
use crate::storage::RedbLedger;
use crate::types::{
    CaseId, CaseStatus, DocumentId, InstallmentId, LedgerError, LegalCase, MilestoneDocument,
    Money, NewPlot, PaymentInstallment, PaymentSchedule, Plot, PlotId, PlotStatus,
};
use chrono::NaiveDate;
use std::path::Path;

/// Log an I/O error and convert Result<T, E> to a default value.
///
/// Used by the infallible count getters so storage errors surface on
/// stderr instead of being swallowed. The CORE avoids a tracing
/// dependency; the app layer redirects stderr if needed.
#[inline]
fn log_and_default<T: Default>(result: Result<T, LedgerError>, context: &str) -> T {
    match result {
        Ok(v) => v,
        Err(e) => {
            eprintln!(
                "{{\"level\":\"warn\",\"target\":\"plotledger_core::session\",\"message\":\"I/O error in {}: {}\"}}",
                context, e
            );
            T::default()
        }
    }
}

/// Storage backend for a Session.
#[derive(Debug)]
pub enum StorageBackend {
    /// In-memory ledger (fast, volatile).
    InMemory(Ledger),
    /// Disk-backed ledger using redb (ACID, persistent).
    Persistent(RedbLedger),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(Ledger::new())
    }
}

// NOTE: StorageBackend does NOT implement Clone.
// RedbLedger (database handle) cannot be safely cloned.
// Use Session::try_clone() for explicit cloning with proper error handling.

/// A Session pairs a storage backend with the domain operations.
macro_rules! with_store {
    ($self:expr, $store:ident => $body:expr) => {
        match &mut $self.backend {
            StorageBackend::InMemory($store) => $body,
            StorageBackend::Persistent($store) => $body,
        }
    };
}

macro_rules! with_store_ref {
    ($self:expr, $store:ident => $body:expr) => {
        match &$self.backend {
            StorageBackend::InMemory($store) => $body,
            StorageBackend::Persistent($store) => $body,
        }
    };
}

/// The Session provides a high-level interface for:
/// - Registering plots and schedules
/// - Recording payments and running the overdue sweep
/// - Issuing and approving documents
/// - Deriving progress and the document board
#[derive(Debug, Default)]
pub struct Session {
    /// The storage backend (in-memory or persistent).
    backend: StorageBackend,
}

impl Session {
    /// Create a new empty session with in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session with an existing in-memory ledger.
    #[must_use]
    pub fn with_ledger(ledger: Ledger) -> Self {
        Self {
            backend: StorageBackend::InMemory(ledger),
        }
    }

    /// Create a session with persistent redb storage.
    ///
    /// Opens or creates a redb database at the given path.
    /// All changes are automatically persisted to disk.
    pub fn with_redb(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let redb = RedbLedger::open(path)?;
        Ok(Self {
            backend: StorageBackend::Persistent(redb),
        })
    }

    /// Create a session with an existing RedbLedger.
    #[must_use]
    pub fn with_redb_ledger(redb: RedbLedger) -> Self {
        Self {
            backend: StorageBackend::Persistent(redb),
        }
    }

    /// Check if using persistent storage.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, StorageBackend::Persistent(_))
    }

    /// Get a reference to the storage backend.
    #[must_use]
    pub fn backend(&self) -> &StorageBackend {
        &self.backend
    }

    /// Try to clone the session.
    ///
    /// Returns `Some(Session)` for in-memory backends with a cloned ledger.
    /// Returns `None` for persistent backends (database handles cannot be
    /// safely cloned).
    #[must_use]
    pub fn try_clone(&self) -> Option<Self> {
        match &self.backend {
            StorageBackend::InMemory(ledger) => Some(Self {
                backend: StorageBackend::InMemory(ledger.clone()),
            }),
            StorageBackend::Persistent(_) => None,
        }
    }

    // =========================================================================
    // PLOTS
    // =========================================================================

    /// Register a new plot.
    pub fn register_plot(&mut self, new: NewPlot, on: NaiveDate) -> Result<Plot, LedgerError> {
        with_store!(self, store => Operations::register_plot(store, new, on))
    }

    /// Lookup a plot by id.
    pub fn plot(&self, id: PlotId) -> Result<Option<Plot>, LedgerError> {
        with_store_ref!(self, store => store.plot(id))
    }

    /// Get all plots.
    pub fn plots(&self) -> Result<Vec<Plot>, LedgerError> {
        with_store_ref!(self, store => store.plots())
    }

    /// Change a plot's sale status.
    pub fn set_plot_status(
        &mut self,
        id: PlotId,
        status: PlotStatus,
        on: NaiveDate,
    ) -> Result<Plot, LedgerError> {
        with_store!(self, store => Operations::set_plot_status(store, id, status, on))
    }

    // =========================================================================
    // SCHEDULES & PAYMENTS
    // =========================================================================

    /// Create the payment schedule for a plot.
    pub fn create_schedule(
        &mut self,
        plot_id: PlotId,
        total_amount: Money,
        down_payment: Money,
        installments: &[InstallmentSpec],
        on: NaiveDate,
    ) -> Result<(PaymentSchedule, Vec<PaymentInstallment>), LedgerError> {
        with_store!(self, store => Operations::create_schedule(
            store,
            plot_id,
            total_amount,
            down_payment,
            installments,
            on,
        ))
    }

    /// Lookup the schedule attached to a plot.
    pub fn schedule_for_plot(
        &self,
        plot: PlotId,
    ) -> Result<Option<PaymentSchedule>, LedgerError> {
        with_store_ref!(self, store => store.schedule_for_plot(plot))
    }

    /// Get a schedule's installments, ordered by position.
    pub fn installments(
        &self,
        schedule: crate::types::ScheduleId,
    ) -> Result<Vec<PaymentInstallment>, LedgerError> {
        with_store_ref!(self, store => store.installments(schedule))
    }

    /// Record a payment against an installment.
    pub fn record_payment(
        &mut self,
        id: InstallmentId,
        paid_on: NaiveDate,
        receipt_uri: Option<String>,
    ) -> Result<PaymentOutcome, LedgerError> {
        with_store!(self, store => Operations::record_payment(store, id, paid_on, receipt_uri))
    }

    /// Sweep every schedule for overdue and defaulted installments.
    pub fn sweep_overdue(&mut self, today: NaiveDate) -> Result<SweepOutcome, LedgerError> {
        with_store!(self, store => Operations::sweep_overdue(store, today))
    }

    // =========================================================================
    // DOCUMENTS
    // =========================================================================

    /// Attach a generated URI to a Ready document.
    pub fn issue_document(
        &mut self,
        id: DocumentId,
        uri: String,
        on: NaiveDate,
    ) -> Result<MilestoneDocument, LedgerError> {
        with_store!(self, store => Operations::issue_document(store, id, uri, on))
    }

    /// Approve a Generated document.
    pub fn approve_document(
        &mut self,
        id: DocumentId,
        approver: String,
        on: NaiveDate,
    ) -> Result<MilestoneDocument, LedgerError> {
        with_store!(self, store => Operations::approve_document(store, id, approver, on))
    }

    /// Get a plot's stored documents.
    pub fn documents_for_plot(
        &self,
        plot: PlotId,
    ) -> Result<Vec<MilestoneDocument>, LedgerError> {
        with_store_ref!(self, store => store.documents_for_plot(plot))
    }

    // =========================================================================
    // LEGAL CASES
    // =========================================================================

    /// Open a legal case by hand.
    pub fn open_case(
        &mut self,
        plot_id: PlotId,
        amount: Money,
        opened_on: NaiveDate,
        description: Option<String>,
    ) -> Result<LegalCase, LedgerError> {
        with_store!(self, store => Operations::open_case(store, plot_id, amount, opened_on, description))
    }

    /// Move a case to a new status.
    pub fn update_case(
        &mut self,
        id: CaseId,
        status: CaseStatus,
        court_date: Option<NaiveDate>,
        filed_by: Option<String>,
        on: NaiveDate,
    ) -> Result<LegalCase, LedgerError> {
        with_store!(self, store => Operations::update_case(store, id, status, court_date, filed_by, on))
    }

    /// Get all cases.
    pub fn cases(&self) -> Result<Vec<LegalCase>, LedgerError> {
        with_store_ref!(self, store => store.cases())
    }

    // =========================================================================
    // DERIVED READS
    // =========================================================================

    /// Derive payment progress for a plot, fresh from stored records.
    pub fn progress(&self, plot: PlotId) -> Result<PaymentProgress, LedgerError> {
        with_store_ref!(self, store => Operations::progress_for_plot(store, plot))
    }

    /// Derive the four-slot document board for a plot.
    pub fn document_board(&self, plot: PlotId) -> Result<Vec<DocumentSlot>, LedgerError> {
        with_store_ref!(self, store => Operations::document_board_for_plot(store, plot))
    }

    /// Get the most recent audit entries, newest first.
    pub fn audit(&self, limit: usize) -> Result<Vec<AuditEntry>, LedgerError> {
        with_store_ref!(self, store => store.audit(limit))
    }

    // =========================================================================
    // METRICS
    // =========================================================================

    /// Get the plot count.
    #[must_use]
    pub fn plot_count(&self) -> usize {
        log_and_default(
            with_store_ref!(self, store => store.plot_count()),
            "plot_count",
        )
    }

    /// Get the schedule count.
    #[must_use]
    pub fn schedule_count(&self) -> usize {
        log_and_default(
            with_store_ref!(self, store => store.schedule_count()),
            "schedule_count",
        )
    }

    /// Get the document count.
    #[must_use]
    pub fn document_count(&self) -> usize {
        log_and_default(
            with_store_ref!(self, store => store.document_count()),
            "document_count",
        )
    }

    /// Get the number of open cases.
    #[must_use]
    pub fn open_case_count(&self) -> usize {
        log_and_default(
            with_store_ref!(self, store => store.open_case_count()),
            "open_case_count",
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::milestone::Milestone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn register(session: &mut Session) -> Plot {
        session
            .register_plot(
                NewPlot {
                    plot_number: "HG-1-001".to_string(),
                    area: "10 marla".to_string(),
                    location: "Phase 1".to_string(),
                    total_value: Money::new(1_000_000),
                },
                date(2024, 1, 1),
            )
            .expect("register")
    }

    #[test]
    fn in_memory_session_full_cycle() {
        let mut session = Session::new();
        assert!(!session.is_persistent());

        let plot = register(&mut session);
        let (_, installments) = session
            .create_schedule(
                plot.id,
                Money::new(1_000_000),
                Money::new(100_000),
                &[InstallmentSpec {
                    amount: Money::new(900_000),
                    due_date: date(2024, 6, 1),
                }],
                date(2024, 1, 1),
            )
            .expect("schedule");

        let outcome = session
            .record_payment(installments[0].id, date(2024, 1, 2), None)
            .expect("pay");
        assert_eq!(outcome.milestone_reached, Some(Milestone::Allotment));
        assert_eq!(session.progress(plot.id).expect("progress").percentage, 10);
        assert_eq!(session.plot_count(), 1);
        assert_eq!(session.schedule_count(), 1);
        assert_eq!(session.document_count(), 1);
    }

    #[test]
    fn try_clone_only_for_in_memory() {
        let session = Session::new();
        assert!(session.try_clone().is_some());
    }

    #[test]
    fn persistent_session_survives_reopen() {
        let temp = tempfile::tempdir().expect("temp dir");
        let db_path = temp.path().join("ledger.redb");

        let plot_id;
        {
            let mut session = Session::with_redb(&db_path).expect("open");
            assert!(session.is_persistent());
            assert!(session.try_clone().is_none());
            plot_id = register(&mut session).id;
        }

        {
            let session = Session::with_redb(&db_path).expect("reopen");
            let plot = session.plot(plot_id).expect("lookup").expect("plot");
            assert_eq!(plot.plot_number, "HG-1-001");
        }
    }

    #[test]
    fn derived_reads_recompute_after_sweep() {
        let mut session = Session::new();
        let plot = register(&mut session);
        session
            .create_schedule(
                plot.id,
                Money::new(1_000_000),
                Money::ZERO,
                &[InstallmentSpec {
                    amount: Money::new(1_000_000),
                    due_date: date(2024, 2, 1),
                }],
                date(2024, 1, 1),
            )
            .expect("schedule");

        let outcome = session.sweep_overdue(date(2024, 4, 1)).expect("sweep");
        assert_eq!(outcome.cases_opened.len(), 1);
        assert_eq!(session.open_case_count(), 1);
        assert_eq!(
            session.plot(plot.id).expect("lookup").expect("plot").status,
            PlotStatus::OnHold
        );
        // Progress still derives from stored records
        assert_eq!(session.progress(plot.id).expect("progress").percentage, 0);
    }
}
