//! # Ledger Operations
//!
//! Domain rules for the PlotLedger CORE.
//!
//! - Validate input before any record mutation
//! - Enforce schedule immutability and status transitions
//! - Derive milestones and document availability, never store them
//!
//! Every operation is generic over `LedgerStore` so the rules hold
//! identically for the in-memory and redb backends. The engine has no
//! clock; callers supply every date.

use crate::documents::{DocumentKind, DocumentSlot, document_board};
use crate::ledger::LedgerStore;
use crate::limits::{GRACE_PERIOD_DAYS, MAX_INSTALLMENTS, MAX_LABEL_LENGTH, MAX_URI_LENGTH};
use crate::milestone::{Milestone, PaymentProgress};
use crate::types::{
    CaseId, CaseStatus, DocumentId, DocumentStatus, InstallmentId, LedgerError, LegalCase,
    MilestoneDocument, Money, NewPlot, PaymentInstallment, PaymentStatus, Plot, PlotId,
    PlotStatus,
};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

// =============================================================================
// OPERATION RESULTS
// =============================================================================

/// One requested installment when creating a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallmentSpec {
    /// Amount due.
    pub amount: Money,
    /// Date the payment falls due.
    pub due_date: NaiveDate,
}

/// Result of recording a payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOutcome {
    /// The installment after the payment was recorded.
    pub installment: PaymentInstallment,
    /// Fresh progress for the plot.
    pub progress: PaymentProgress,
    /// The highest milestone this payment crossed, if any.
    pub milestone_reached: Option<Milestone>,
}

/// Result of an overdue sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepOutcome {
    /// Installments newly marked Overdue.
    pub marked_overdue: Vec<InstallmentId>,
    /// Installments escalated to Failed, with the case opened for each.
    pub cases_opened: Vec<(InstallmentId, CaseId)>,
}

/// The Operations layer applies domain rules to any ledger store.
///
/// Operations:
/// - Accept raw input from the app layer
/// - Validate it against the engine limits
/// - Apply the mutation and append the audit trail
pub struct Operations;

impl Operations {
    // =========================================================================
    // PLOTS
    // =========================================================================

    /// Register a new plot.
    pub fn register_plot<L: LedgerStore>(
        store: &mut L,
        new: NewPlot,
        on: NaiveDate,
    ) -> Result<Plot, LedgerError> {
        validate_label(&new.plot_number, "plot number")?;
        validate_label(&new.area, "area")?;
        validate_label(&new.location, "location")?;
        if !new.total_value.is_positive() {
            return Err(LedgerError::InvalidSchedule(
                "plot total value must be positive".to_string(),
            ));
        }

        let plot = store.insert_plot(new)?;
        store.append_audit(
            on,
            crate::audit::AuditAction::PlotRegistered,
            Some(plot.id),
            format!("plot {} registered, {}", plot.plot_number, plot.total_value),
        )?;
        Ok(plot)
    }

    /// Change a plot's sale status.
    pub fn set_plot_status<L: LedgerStore>(
        store: &mut L,
        id: PlotId,
        status: PlotStatus,
        on: NaiveDate,
    ) -> Result<Plot, LedgerError> {
        let mut plot = store.plot(id)?.ok_or(LedgerError::PlotNotFound(id))?;
        if plot.status == status {
            return Ok(plot);
        }
        let previous = plot.status;
        plot.status = status;
        store.update_plot(&plot)?;
        store.append_audit(
            on,
            crate::audit::AuditAction::PlotStatusChanged,
            Some(id),
            format!("{} -> {}", previous.as_str(), status.as_str()),
        )?;
        Ok(plot)
    }

    // =========================================================================
    // SCHEDULES
    // =========================================================================

    /// Create the payment schedule for a plot.
    ///
    /// Validation:
    /// - The plot exists and has no schedule yet (schedules are immutable,
    ///   a second schedule is rejected outright)
    /// - Every amount is positive, the down payment non-negative
    /// - Down payment plus installment amounts sum to exactly the total
    ///
    /// A positive down payment becomes installment 1, due on the creation
    /// date. The plot moves to Sold.
    pub fn create_schedule<L: LedgerStore>(
        store: &mut L,
        plot_id: PlotId,
        total_amount: Money,
        down_payment: Money,
        installments: &[InstallmentSpec],
        on: NaiveDate,
    ) -> Result<(crate::types::PaymentSchedule, Vec<PaymentInstallment>), LedgerError> {
        let plot = store
            .plot(plot_id)?
            .ok_or(LedgerError::PlotNotFound(plot_id))?;
        if store.schedule_for_plot(plot_id)?.is_some() {
            return Err(LedgerError::ScheduleExists(plot_id));
        }

        if !total_amount.is_positive() {
            return Err(LedgerError::InvalidSchedule(
                "total amount must be positive".to_string(),
            ));
        }
        if down_payment.value() < 0 {
            return Err(LedgerError::InvalidSchedule(
                "down payment cannot be negative".to_string(),
            ));
        }
        if installments.is_empty() && !down_payment.is_positive() {
            return Err(LedgerError::InvalidSchedule(
                "schedule has no installments".to_string(),
            ));
        }
        if installments.len() > MAX_INSTALLMENTS {
            return Err(LedgerError::InvalidSchedule(format!(
                "schedule exceeds {MAX_INSTALLMENTS} installments"
            )));
        }
        let mut sum = down_payment;
        for spec in installments {
            if !spec.amount.is_positive() {
                return Err(LedgerError::InvalidSchedule(
                    "installment amounts must be positive".to_string(),
                ));
            }
            sum = sum.saturating_add(spec.amount);
        }
        if sum != total_amount {
            return Err(LedgerError::InvalidSchedule(format!(
                "amounts sum to {sum}, expected {total_amount}"
            )));
        }

        let has_down = down_payment.is_positive();
        let count = installments.len() as u32 + u32::from(has_down);
        let schedule = store.insert_schedule(plot_id, total_amount, down_payment, count)?;

        let mut created = Vec::with_capacity(count as usize);
        let mut number = 1u32;
        if has_down {
            created.push(store.insert_installment(schedule.id, number, down_payment, on)?);
            number += 1;
        }
        for spec in installments {
            created.push(store.insert_installment(
                schedule.id,
                number,
                spec.amount,
                spec.due_date,
            )?);
            number += 1;
        }

        let mut plot = plot;
        plot.status = PlotStatus::Sold;
        store.update_plot(&plot)?;
        store.append_audit(
            on,
            crate::audit::AuditAction::ScheduleCreated,
            Some(plot_id),
            format!("{count} installments totalling {total_amount}"),
        )?;

        Ok((schedule, created))
    }

    // =========================================================================
    // PAYMENTS
    // =========================================================================

    /// Record a payment against an installment.
    ///
    /// Pending or Overdue installments become Paid; anything else is
    /// rejected. When the plot's derived milestone crosses one or more
    /// thresholds, a Ready document slot is created for each crossed
    /// milestone and the highest is reported back.
    pub fn record_payment<L: LedgerStore>(
        store: &mut L,
        id: InstallmentId,
        paid_on: NaiveDate,
        receipt_uri: Option<String>,
    ) -> Result<PaymentOutcome, LedgerError> {
        if let Some(uri) = &receipt_uri {
            validate_uri(uri)?;
        }

        let mut installment = store
            .installment(id)?
            .ok_or(LedgerError::InstallmentNotFound(id))?;
        if !installment.status.is_payable() {
            return Err(LedgerError::InvalidPayment(format!(
                "installment {} is {}",
                installment.number,
                installment.status.as_str()
            )));
        }

        let schedule = store
            .schedule(installment.schedule_id)?
            .ok_or(LedgerError::ScheduleNotFound(installment.schedule_id))?;
        let before = PaymentProgress::assess(
            schedule.total_amount,
            &store.installments(schedule.id)?,
        );

        installment.status = PaymentStatus::Paid;
        installment.paid_date = Some(paid_on);
        installment.receipt_uri = receipt_uri;
        store.update_installment(&installment)?;

        let after = PaymentProgress::assess(
            schedule.total_amount,
            &store.installments(schedule.id)?,
        );
        store.append_audit(
            paid_on,
            crate::audit::AuditAction::PaymentReceived,
            Some(schedule.plot_id),
            format!("installment {} paid, {}", installment.number, installment.amount),
        )?;

        let crossed = after.milestones_crossed(&before);
        for milestone in &crossed {
            Self::ensure_document_slot(store, schedule.plot_id, *milestone, paid_on)?;
        }

        Ok(PaymentOutcome {
            installment,
            progress: after,
            milestone_reached: crossed.last().copied(),
        })
    }

    /// Create the Ready document slot for a crossed milestone, if it does
    /// not already exist.
    fn ensure_document_slot<L: LedgerStore>(
        store: &mut L,
        plot_id: PlotId,
        milestone: Milestone,
        on: NaiveDate,
    ) -> Result<(), LedgerError> {
        let Some(kind) = DocumentKind::for_milestone(milestone) else {
            return Ok(());
        };
        let exists = store
            .documents_for_plot(plot_id)?
            .iter()
            .any(|d| d.kind == kind);
        if !exists {
            store.insert_document(plot_id, kind)?;
        }
        store.append_audit(
            on,
            crate::audit::AuditAction::MilestoneReached,
            Some(plot_id),
            format!("{milestone}"),
        )?;
        Ok(())
    }

    /// Sweep every schedule for overdue and defaulted installments.
    ///
    /// Two passes in one walk, using the supplied date:
    /// - Pending installments past their due date become Overdue
    /// - Payable installments past due date + grace period become Failed,
    ///   a legal case is opened and the plot is frozen OnHold
    ///
    /// Never computed lazily: derived reads report whatever the last sweep
    /// left behind.
    pub fn sweep_overdue<L: LedgerStore>(
        store: &mut L,
        today: NaiveDate,
    ) -> Result<SweepOutcome, LedgerError> {
        let mut outcome = SweepOutcome::default();

        for plot in store.plots()? {
            let Some(schedule) = store.schedule_for_plot(plot.id)? else {
                continue;
            };
            for mut installment in store.installments(schedule.id)? {
                if !installment.status.is_payable() {
                    continue;
                }
                let grace_end = installment
                    .due_date
                    .checked_add_days(Days::new(GRACE_PERIOD_DAYS as u64))
                    .unwrap_or(installment.due_date);

                if grace_end < today {
                    installment.status = PaymentStatus::Failed;
                    store.update_installment(&installment)?;
                    let case = store.insert_case(
                        plot.id,
                        Some(installment.id),
                        installment.amount,
                        today,
                        grace_end,
                        Some(format!(
                            "installment {} unpaid past grace period",
                            installment.number
                        )),
                    )?;
                    store.append_audit(
                        today,
                        crate::audit::AuditAction::CaseOpened,
                        Some(plot.id),
                        format!("default on installment {}", installment.number),
                    )?;
                    Self::set_plot_status(store, plot.id, PlotStatus::OnHold, today)?;
                    outcome.cases_opened.push((installment.id, case.id));
                } else if installment.status == PaymentStatus::Pending
                    && installment.due_date < today
                {
                    installment.status = PaymentStatus::Overdue;
                    store.update_installment(&installment)?;
                    store.append_audit(
                        today,
                        crate::audit::AuditAction::PaymentOverdue,
                        Some(plot.id),
                        format!("installment {} overdue", installment.number),
                    )?;
                    outcome.marked_overdue.push(installment.id);
                }
            }
        }

        Ok(outcome)
    }

    // =========================================================================
    // DOCUMENTS
    // =========================================================================

    /// Attach a generated URI to a Ready document.
    pub fn issue_document<L: LedgerStore>(
        store: &mut L,
        id: DocumentId,
        uri: String,
        on: NaiveDate,
    ) -> Result<MilestoneDocument, LedgerError> {
        validate_uri(&uri)?;
        let mut document = store
            .document(id)?
            .ok_or(LedgerError::DocumentNotFound(id))?;
        if document.status != DocumentStatus::Ready {
            return Err(LedgerError::InvalidTransition(format!(
                "document is {}, expected ready",
                document.status.as_str()
            )));
        }
        document.status = DocumentStatus::Generated;
        document.generated_uri = Some(uri);
        document.generated_on = Some(on);
        store.update_document(&document)?;
        store.append_audit(
            on,
            crate::audit::AuditAction::DocumentIssued,
            Some(document.plot_id),
            document.kind.label().to_string(),
        )?;
        Ok(document)
    }

    /// Approve a Generated document.
    pub fn approve_document<L: LedgerStore>(
        store: &mut L,
        id: DocumentId,
        approver: String,
        on: NaiveDate,
    ) -> Result<MilestoneDocument, LedgerError> {
        validate_label(&approver, "approver")?;
        let mut document = store
            .document(id)?
            .ok_or(LedgerError::DocumentNotFound(id))?;
        if document.status != DocumentStatus::Generated {
            return Err(LedgerError::InvalidTransition(format!(
                "document is {}, expected generated",
                document.status.as_str()
            )));
        }
        document.status = DocumentStatus::Approved;
        document.approved_on = Some(on);
        document.approved_by = Some(approver);
        store.update_document(&document)?;
        store.append_audit(
            on,
            crate::audit::AuditAction::DocumentApproved,
            Some(document.plot_id),
            document.kind.label().to_string(),
        )?;
        Ok(document)
    }

    // =========================================================================
    // LEGAL CASES
    // =========================================================================

    /// Open a legal case by hand, outside the sweep. Freezes the plot.
    pub fn open_case<L: LedgerStore>(
        store: &mut L,
        plot_id: PlotId,
        amount: Money,
        opened_on: NaiveDate,
        description: Option<String>,
    ) -> Result<LegalCase, LedgerError> {
        if store.plot(plot_id)?.is_none() {
            return Err(LedgerError::PlotNotFound(plot_id));
        }
        if let Some(d) = &description {
            validate_label(d, "description")?;
        }
        let case = store.insert_case(plot_id, None, amount, opened_on, opened_on, description)?;
        store.append_audit(
            opened_on,
            crate::audit::AuditAction::CaseOpened,
            Some(plot_id),
            format!("case opened over {amount}"),
        )?;
        Self::set_plot_status(store, plot_id, PlotStatus::OnHold, opened_on)?;
        Ok(case)
    }

    /// Move a case to a new status.
    ///
    /// Forward-only transitions; closing the last open case for a plot
    /// releases the OnHold freeze back to Sold.
    pub fn update_case<L: LedgerStore>(
        store: &mut L,
        id: CaseId,
        status: CaseStatus,
        court_date: Option<NaiveDate>,
        filed_by: Option<String>,
        on: NaiveDate,
    ) -> Result<LegalCase, LedgerError> {
        let mut case = store.case(id)?.ok_or(LedgerError::CaseNotFound(id))?;
        if !case.status.can_transition_to(status) {
            return Err(LedgerError::InvalidTransition(format!(
                "{} -> {}",
                case.status.as_str(),
                status.as_str()
            )));
        }
        if let Some(filer) = &filed_by {
            validate_label(filer, "filed by")?;
        }

        let previous = case.status;
        case.status = status;
        if court_date.is_some() {
            case.court_date = court_date;
        }
        if filed_by.is_some() {
            case.filed_by = filed_by;
        }
        store.update_case(&case)?;
        store.append_audit(
            on,
            crate::audit::AuditAction::CaseUpdated,
            Some(case.plot_id),
            format!("{} -> {}", previous.as_str(), status.as_str()),
        )?;

        if !status.is_open() {
            let still_open = store
                .cases()?
                .iter()
                .any(|c| c.plot_id == case.plot_id && c.status.is_open());
            if !still_open {
                Self::set_plot_status(store, case.plot_id, PlotStatus::Sold, on)?;
            }
        }

        Ok(case)
    }

    // =========================================================================
    // DERIVED READS
    // =========================================================================

    /// Derive payment progress for a plot.
    ///
    /// Recomputed fresh from stored records on every call. A plot with no
    /// schedule yields the degenerate zero result.
    pub fn progress_for_plot<L: LedgerStore>(
        store: &L,
        plot_id: PlotId,
    ) -> Result<PaymentProgress, LedgerError> {
        if store.plot(plot_id)?.is_none() {
            return Err(LedgerError::PlotNotFound(plot_id));
        }
        let Some(schedule) = store.schedule_for_plot(plot_id)? else {
            return Ok(PaymentProgress::unscheduled());
        };
        let installments = store.installments(schedule.id)?;
        Ok(PaymentProgress::assess(schedule.total_amount, &installments))
    }

    /// Derive the four-slot document board for a plot.
    pub fn document_board_for_plot<L: LedgerStore>(
        store: &L,
        plot_id: PlotId,
    ) -> Result<Vec<DocumentSlot>, LedgerError> {
        let progress = Self::progress_for_plot(store, plot_id)?;
        let documents = store.documents_for_plot(plot_id)?;
        Ok(document_board(plot_id, progress.milestone, &documents))
    }
}

// =============================================================================
// VALIDATION HELPERS
// =============================================================================

/// Label strings must be non-empty and within length limits.
fn validate_label(value: &str, what: &str) -> Result<(), LedgerError> {
    if value.trim().is_empty() {
        return Err(LedgerError::InvalidSchedule(format!("{what} is empty")));
    }
    if value.len() > MAX_LABEL_LENGTH {
        return Err(LedgerError::InvalidSchedule(format!(
            "{what} exceeds {MAX_LABEL_LENGTH} bytes"
        )));
    }
    Ok(())
}

/// URIs must be non-empty and within length limits.
fn validate_uri(uri: &str) -> Result<(), LedgerError> {
    if uri.trim().is_empty() {
        return Err(LedgerError::InvalidPayment("uri is empty".to_string()));
    }
    if uri.len() > MAX_URI_LENGTH {
        return Err(LedgerError::InvalidPayment(format!(
            "uri exceeds {MAX_URI_LENGTH} bytes"
        )));
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
