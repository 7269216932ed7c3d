//! # Ledger Engine
//!
//! The deterministic record storage for the PlotLedger CORE.
//!
//! This module defines the `LedgerStore` trait and its in-memory
//! implementation. All data structures use `BTreeMap` for deterministic
//! ordering. Domain rules (schedule validation, milestone crossing, the
//! overdue sweep) live in the `ops` module and run identically against any
//! `LedgerStore`.

use crate::audit::{AuditAction, AuditEntry};
use crate::documents::DocumentKind;
use crate::limits::MAX_AUDIT_QUERY;
use crate::types::{
    CaseId, CaseStatus, DocumentId, DocumentStatus, InstallmentId, LedgerError, LegalCase,
    MilestoneDocument, Money, NewPlot, PaymentInstallment, PaymentSchedule, PaymentStatus, Plot,
    PlotId, PlotStatus, ScheduleId,
};
use chrono::NaiveDate;
use std::collections::BTreeMap;

// =============================================================================
// LEDGERSTORE TRAIT
// =============================================================================

/// The LedgerStore trait defines the record operations every backend
/// implements.
///
/// These are primitive reads and writes; invariant checks belong to the
/// operations layer so they hold identically for in-memory and persistent
/// storage.
///
/// All fallible operations return `Result<T, LedgerError>` so both backends
/// can be used uniformly.
pub trait LedgerStore {
    /// Insert a plot, allocating its id. The plot starts Available.
    fn insert_plot(&mut self, new: NewPlot) -> Result<Plot, LedgerError>;

    /// Lookup a plot by id. Returns an owned record for storage compatibility.
    fn plot(&self, id: PlotId) -> Result<Option<Plot>, LedgerError>;

    /// Get all plots, ordered by id.
    fn plots(&self) -> Result<Vec<Plot>, LedgerError>;

    /// Overwrite a stored plot.
    fn update_plot(&mut self, plot: &Plot) -> Result<(), LedgerError>;

    /// Insert a schedule for a plot, allocating its id.
    fn insert_schedule(
        &mut self,
        plot_id: PlotId,
        total_amount: Money,
        down_payment: Money,
        installment_count: u32,
    ) -> Result<PaymentSchedule, LedgerError>;

    /// Lookup a schedule by id.
    fn schedule(&self, id: ScheduleId) -> Result<Option<PaymentSchedule>, LedgerError>;

    /// Lookup the schedule attached to a plot, if any.
    fn schedule_for_plot(&self, plot: PlotId) -> Result<Option<PaymentSchedule>, LedgerError>;

    /// Insert an installment in Pending status, allocating its id.
    fn insert_installment(
        &mut self,
        schedule_id: ScheduleId,
        number: u32,
        amount: Money,
        due_date: NaiveDate,
    ) -> Result<PaymentInstallment, LedgerError>;

    /// Lookup an installment by id.
    fn installment(&self, id: InstallmentId) -> Result<Option<PaymentInstallment>, LedgerError>;

    /// Get a schedule's installments, ordered by position.
    fn installments(&self, schedule: ScheduleId) -> Result<Vec<PaymentInstallment>, LedgerError>;

    /// Overwrite a stored installment.
    fn update_installment(&mut self, installment: &PaymentInstallment) -> Result<(), LedgerError>;

    /// Insert a document slot in Ready status, allocating its id.
    fn insert_document(
        &mut self,
        plot_id: PlotId,
        kind: DocumentKind,
    ) -> Result<MilestoneDocument, LedgerError>;

    /// Lookup a document by id.
    fn document(&self, id: DocumentId) -> Result<Option<MilestoneDocument>, LedgerError>;

    /// Get a plot's documents, ordered by id.
    fn documents_for_plot(&self, plot: PlotId) -> Result<Vec<MilestoneDocument>, LedgerError>;

    /// Overwrite a stored document.
    fn update_document(&mut self, document: &MilestoneDocument) -> Result<(), LedgerError>;

    /// Insert a legal case in Recorded status, allocating its id.
    fn insert_case(
        &mut self,
        plot_id: PlotId,
        installment_id: Option<InstallmentId>,
        amount: Money,
        opened_on: NaiveDate,
        grace_period_end: NaiveDate,
        description: Option<String>,
    ) -> Result<LegalCase, LedgerError>;

    /// Lookup a case by id.
    fn case(&self, id: CaseId) -> Result<Option<LegalCase>, LedgerError>;

    /// Get all cases, ordered by id.
    fn cases(&self) -> Result<Vec<LegalCase>, LedgerError>;

    /// Overwrite a stored case.
    fn update_case(&mut self, case: &LegalCase) -> Result<(), LedgerError>;

    /// Append an audit entry. Returns the assigned sequence number.
    fn append_audit(
        &mut self,
        on: NaiveDate,
        action: AuditAction,
        plot: Option<PlotId>,
        detail: String,
    ) -> Result<u64, LedgerError>;

    /// Get the most recent audit entries, newest first.
    ///
    /// `limit` is capped at `MAX_AUDIT_QUERY`.
    fn audit(&self, limit: usize) -> Result<Vec<AuditEntry>, LedgerError>;

    /// Get the total number of plots.
    fn plot_count(&self) -> Result<usize, LedgerError>;

    /// Get the total number of schedules.
    fn schedule_count(&self) -> Result<usize, LedgerError>;

    /// Get the total number of documents.
    fn document_count(&self) -> Result<usize, LedgerError>;

    /// Get the number of cases still open.
    fn open_case_count(&self) -> Result<usize, LedgerError>;
}

// =============================================================================
// IN-MEMORY LEDGER
// =============================================================================

/// The in-memory Ledger.
///
/// Uses `BTreeMap` exclusively for deterministic ordering.
/// No `HashMap` allowed.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    /// Plot storage: PlotId -> Plot
    plots: BTreeMap<PlotId, Plot>,

    /// Schedule storage: ScheduleId -> PaymentSchedule
    schedules: BTreeMap<ScheduleId, PaymentSchedule>,

    /// Reverse lookup: PlotId -> ScheduleId (one schedule per plot)
    plot_schedule: BTreeMap<PlotId, ScheduleId>,

    /// Installment storage: InstallmentId -> PaymentInstallment
    installments: BTreeMap<InstallmentId, PaymentInstallment>,

    /// Document storage: DocumentId -> MilestoneDocument
    documents: BTreeMap<DocumentId, MilestoneDocument>,

    /// Case storage: CaseId -> LegalCase
    cases: BTreeMap<CaseId, LegalCase>,

    /// Append-only audit log, oldest first.
    audit_log: Vec<AuditEntry>,

    /// Next available ids.
    next_plot_id: u64,
    next_schedule_id: u64,
    next_installment_id: u64,
    next_document_id: u64,
    next_case_id: u64,
}

impl Ledger {
    /// Create a new empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerStore for Ledger {
    fn insert_plot(&mut self, new: NewPlot) -> Result<Plot, LedgerError> {
        self.next_plot_id += 1;
        let plot = Plot {
            id: PlotId(self.next_plot_id),
            plot_number: new.plot_number,
            area: new.area,
            location: new.location,
            total_value: new.total_value,
            status: PlotStatus::Available,
        };
        self.plots.insert(plot.id, plot.clone());
        Ok(plot)
    }

    fn plot(&self, id: PlotId) -> Result<Option<Plot>, LedgerError> {
        Ok(self.plots.get(&id).cloned())
    }

    fn plots(&self) -> Result<Vec<Plot>, LedgerError> {
        Ok(self.plots.values().cloned().collect())
    }

    fn update_plot(&mut self, plot: &Plot) -> Result<(), LedgerError> {
        if !self.plots.contains_key(&plot.id) {
            return Err(LedgerError::PlotNotFound(plot.id));
        }
        self.plots.insert(plot.id, plot.clone());
        Ok(())
    }

    fn insert_schedule(
        &mut self,
        plot_id: PlotId,
        total_amount: Money,
        down_payment: Money,
        installment_count: u32,
    ) -> Result<PaymentSchedule, LedgerError> {
        self.next_schedule_id += 1;
        let schedule = PaymentSchedule {
            id: ScheduleId(self.next_schedule_id),
            plot_id,
            total_amount,
            down_payment,
            installment_count,
        };
        self.schedules.insert(schedule.id, schedule.clone());
        self.plot_schedule.insert(plot_id, schedule.id);
        Ok(schedule)
    }

    fn schedule(&self, id: ScheduleId) -> Result<Option<PaymentSchedule>, LedgerError> {
        Ok(self.schedules.get(&id).cloned())
    }

    fn schedule_for_plot(&self, plot: PlotId) -> Result<Option<PaymentSchedule>, LedgerError> {
        Ok(self
            .plot_schedule
            .get(&plot)
            .and_then(|id| self.schedules.get(id))
            .cloned())
    }

    fn insert_installment(
        &mut self,
        schedule_id: ScheduleId,
        number: u32,
        amount: Money,
        due_date: NaiveDate,
    ) -> Result<PaymentInstallment, LedgerError> {
        self.next_installment_id += 1;
        let installment = PaymentInstallment {
            id: InstallmentId(self.next_installment_id),
            schedule_id,
            number,
            amount,
            due_date,
            status: PaymentStatus::Pending,
            paid_date: None,
            receipt_uri: None,
        };
        self.installments.insert(installment.id, installment.clone());
        Ok(installment)
    }

    fn installment(&self, id: InstallmentId) -> Result<Option<PaymentInstallment>, LedgerError> {
        Ok(self.installments.get(&id).cloned())
    }

    fn installments(&self, schedule: ScheduleId) -> Result<Vec<PaymentInstallment>, LedgerError> {
        let mut items: Vec<_> = self
            .installments
            .values()
            .filter(|i| i.schedule_id == schedule)
            .cloned()
            .collect();
        items.sort_by_key(|i| i.number);
        Ok(items)
    }

    fn update_installment(&mut self, installment: &PaymentInstallment) -> Result<(), LedgerError> {
        if !self.installments.contains_key(&installment.id) {
            return Err(LedgerError::InstallmentNotFound(installment.id));
        }
        self.installments.insert(installment.id, installment.clone());
        Ok(())
    }

    fn insert_document(
        &mut self,
        plot_id: PlotId,
        kind: DocumentKind,
    ) -> Result<MilestoneDocument, LedgerError> {
        self.next_document_id += 1;
        let document = MilestoneDocument {
            id: DocumentId(self.next_document_id),
            plot_id,
            kind,
            status: DocumentStatus::Ready,
            generated_uri: None,
            generated_on: None,
            approved_on: None,
            approved_by: None,
        };
        self.documents.insert(document.id, document.clone());
        Ok(document)
    }

    fn document(&self, id: DocumentId) -> Result<Option<MilestoneDocument>, LedgerError> {
        Ok(self.documents.get(&id).cloned())
    }

    fn documents_for_plot(&self, plot: PlotId) -> Result<Vec<MilestoneDocument>, LedgerError> {
        Ok(self
            .documents
            .values()
            .filter(|d| d.plot_id == plot)
            .cloned()
            .collect())
    }

    fn update_document(&mut self, document: &MilestoneDocument) -> Result<(), LedgerError> {
        if !self.documents.contains_key(&document.id) {
            return Err(LedgerError::DocumentNotFound(document.id));
        }
        self.documents.insert(document.id, document.clone());
        Ok(())
    }

    fn insert_case(
        &mut self,
        plot_id: PlotId,
        installment_id: Option<InstallmentId>,
        amount: Money,
        opened_on: NaiveDate,
        grace_period_end: NaiveDate,
        description: Option<String>,
    ) -> Result<LegalCase, LedgerError> {
        self.next_case_id += 1;
        let case = LegalCase {
            id: CaseId(self.next_case_id),
            plot_id,
            installment_id,
            amount,
            opened_on,
            grace_period_end,
            status: CaseStatus::Recorded,
            court_date: None,
            filed_by: None,
            description,
        };
        self.cases.insert(case.id, case.clone());
        Ok(case)
    }

    fn case(&self, id: CaseId) -> Result<Option<LegalCase>, LedgerError> {
        Ok(self.cases.get(&id).cloned())
    }

    fn cases(&self) -> Result<Vec<LegalCase>, LedgerError> {
        Ok(self.cases.values().cloned().collect())
    }

    fn update_case(&mut self, case: &LegalCase) -> Result<(), LedgerError> {
        if !self.cases.contains_key(&case.id) {
            return Err(LedgerError::CaseNotFound(case.id));
        }
        self.cases.insert(case.id, case.clone());
        Ok(())
    }

    fn append_audit(
        &mut self,
        on: NaiveDate,
        action: AuditAction,
        plot: Option<PlotId>,
        detail: String,
    ) -> Result<u64, LedgerError> {
        let seq = self.audit_log.len() as u64 + 1;
        self.audit_log.push(AuditEntry {
            seq,
            on,
            action,
            plot,
            detail,
        });
        Ok(seq)
    }

    fn audit(&self, limit: usize) -> Result<Vec<AuditEntry>, LedgerError> {
        let limit = limit.min(MAX_AUDIT_QUERY);
        Ok(self.audit_log.iter().rev().take(limit).cloned().collect())
    }

    fn plot_count(&self) -> Result<usize, LedgerError> {
        Ok(self.plots.len())
    }

    fn schedule_count(&self) -> Result<usize, LedgerError> {
        Ok(self.schedules.len())
    }

    fn document_count(&self) -> Result<usize, LedgerError> {
        Ok(self.documents.len())
    }

    fn open_case_count(&self) -> Result<usize, LedgerError> {
        Ok(self.cases.values().filter(|c| c.status.is_open()).count())
    }
}

// =============================================================================
// TESTS
// =============================================================================
