//! # Core Type Definitions
//!
//! This module contains all entity types for the PlotLedger deterministic
//! ledger engine:
//! - Record identifiers (`PlotId`, `ScheduleId`, `InstallmentId`, ...)
//! - Money representation (`Money`)
//! - Plot, payment schedule and installment records
//! - Milestone document and legal case records
//! - Error types (`LedgerError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Use integer arithmetic only (no floating-point; money is whole rupees)
//! - Implement `Ord` for deterministic ordering in `BTreeMap`/`BTreeSet`
//! - Use saturating arithmetic for money to prevent overflow

use crate::documents::DocumentKind;
use crate::milestone::Milestone;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// RECORD IDENTIFIERS
// =============================================================================

/// Unique identifier for a plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlotId(pub u64);

/// Unique identifier for a payment schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScheduleId(pub u64);

/// Unique identifier for a payment installment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InstallmentId(pub u64);

/// Unique identifier for a milestone document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub u64);

/// Unique identifier for a legal case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CaseId(pub u64);

// =============================================================================
// MONEY
// =============================================================================

/// An amount of money in whole rupees.
///
/// Uses i64 with saturating arithmetic. The engine never performs
/// floating-point arithmetic; percentages are derived with integer math.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Money(pub i64);

impl Money {
    /// Zero rupees.
    pub const ZERO: Money = Money(0);

    /// Create a new amount.
    #[must_use]
    pub const fn new(rupees: i64) -> Self {
        Self(rupees)
    }

    /// Get the raw rupee value.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }

    /// Add another amount using saturating arithmetic.
    #[must_use]
    pub const fn saturating_add(self, other: Money) -> Money {
        Money(self.0.saturating_add(other.0))
    }

    /// Subtract another amount using saturating arithmetic.
    #[must_use]
    pub const fn saturating_sub(self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0))
    }

    /// Check whether the amount is strictly positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PKR {}", self.0)
    }
}

// =============================================================================
// PLOT
// =============================================================================

/// Sale status of a plot.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum PlotStatus {
    /// Listed, no purchaser attached.
    #[default]
    Available,
    /// Application accepted, schedule not yet in force.
    Reserved,
    /// Sold under an active payment schedule.
    Sold,
    /// Frozen pending legal resolution.
    OnHold,
}

impl PlotStatus {
    /// Get the status as a wire string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            PlotStatus::Available => "available",
            PlotStatus::Reserved => "reserved",
            PlotStatus::Sold => "sold",
            PlotStatus::OnHold => "on_hold",
        }
    }
}

/// A plot of land offered for sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plot {
    /// The plot identifier.
    pub id: PlotId,
    /// Human-facing plot number, e.g. "HG-1-042".
    pub plot_number: String,
    /// Plot area, e.g. "10 marla".
    pub area: String,
    /// Location within the development, e.g. "Phase 1, Block C".
    pub location: String,
    /// Total sale value of the plot.
    pub total_value: Money,
    /// Current sale status.
    pub status: PlotStatus,
}

/// Fields for registering a new plot (identifier assigned by the ledger).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPlot {
    pub plot_number: String,
    pub area: String,
    pub location: String,
    pub total_value: Money,
}

// =============================================================================
// PAYMENT SCHEDULE
// =============================================================================

/// A plot's payment obligation, split into installments.
///
/// One schedule per plot. Immutable once created: there is no amendment
/// operation anywhere in the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSchedule {
    /// The schedule identifier.
    pub id: ScheduleId,
    /// The plot this schedule pays for.
    pub plot_id: PlotId,
    /// Total obligation. Installment amounts sum to exactly this value.
    pub total_amount: Money,
    /// The up-front portion, recorded as the first installment.
    pub down_payment: Money,
    /// Number of installments in the schedule.
    pub installment_count: u32,
}

/// Lifecycle status of a single installment.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Created with the schedule, not yet due or not yet paid.
    #[default]
    Pending,
    /// Payment received and recorded.
    Paid,
    /// Due date passed without payment (set by the overdue sweep).
    Overdue,
    /// Grace period elapsed after the due date; escalated to a case.
    Failed,
}

impl PaymentStatus {
    /// Get the status as a wire string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Overdue => "overdue",
            PaymentStatus::Failed => "failed",
        }
    }

    /// Whether a payment can still be recorded against this status.
    #[must_use]
    pub fn is_payable(&self) -> bool {
        matches!(self, PaymentStatus::Pending | PaymentStatus::Overdue)
    }
}

/// A single scheduled payment obligation within a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInstallment {
    /// The installment identifier.
    pub id: InstallmentId,
    /// The schedule this installment belongs to. Exactly one.
    pub schedule_id: ScheduleId,
    /// 1-based position within the schedule.
    pub number: u32,
    /// Amount due.
    pub amount: Money,
    /// Date the payment falls due.
    pub due_date: NaiveDate,
    /// Current lifecycle status.
    pub status: PaymentStatus,
    /// Date the payment was received, once paid.
    pub paid_date: Option<NaiveDate>,
    /// Receipt reference, once paid.
    pub receipt_uri: Option<String>,
}

// =============================================================================
// MILESTONE DOCUMENT
// =============================================================================

/// Issuance status of a milestone document.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Milestone reached; document slot created, nothing issued yet.
    #[default]
    Ready,
    /// Document prepared and a URI attached by the back office.
    Generated,
    /// Document approved and final.
    Approved,
}

impl DocumentStatus {
    /// Get the status as a wire string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Ready => "ready",
            DocumentStatus::Generated => "generated",
            DocumentStatus::Approved => "approved",
        }
    }
}

/// A legal/administrative document tied to a payment milestone.
///
/// Keyed by (plot, document kind); the kind fixes the milestone percentage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneDocument {
    /// The document identifier.
    pub id: DocumentId,
    /// The plot this document belongs to.
    pub plot_id: PlotId,
    /// Which of the four fixed documents this is.
    pub kind: DocumentKind,
    /// Issuance status.
    pub status: DocumentStatus,
    /// Storage URI once the document has been generated.
    pub generated_uri: Option<String>,
    /// Date the URI was attached.
    pub generated_on: Option<NaiveDate>,
    /// Date of approval.
    pub approved_on: Option<NaiveDate>,
    /// Who approved the document.
    pub approved_by: Option<String>,
}

impl MilestoneDocument {
    /// The payment milestone that gates this document.
    #[must_use]
    pub fn milestone(&self) -> Milestone {
        self.kind.milestone()
    }

    /// The milestone percentage this document is keyed by.
    #[must_use]
    pub fn level(&self) -> u8 {
        self.kind.milestone().level()
    }
}

// =============================================================================
// LEGAL CASE
// =============================================================================

/// Lifecycle status of a legal case over a defaulted payment.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    /// Default recorded after the grace period elapsed.
    #[default]
    Recorded,
    /// Case filed with the court.
    Filed,
    /// Proceedings in progress.
    InProgress,
    /// Resolved (payment recovered or settled).
    Resolved,
    /// Closed without resolution.
    Closed,
}

impl CaseStatus {
    /// Get the status as a wire string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::Recorded => "recorded",
            CaseStatus::Filed => "filed",
            CaseStatus::InProgress => "in_progress",
            CaseStatus::Resolved => "resolved",
            CaseStatus::Closed => "closed",
        }
    }

    /// Whether the case is still open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !matches!(self, CaseStatus::Resolved | CaseStatus::Closed)
    }

    /// Check whether a transition to `next` is legal.
    ///
    /// Cases move forward only: Recorded -> Filed -> InProgress, and any
    /// open case may be Resolved or Closed.
    #[must_use]
    pub fn can_transition_to(&self, next: CaseStatus) -> bool {
        match (self, next) {
            (CaseStatus::Recorded, CaseStatus::Filed)
            | (CaseStatus::Filed, CaseStatus::InProgress) => true,
            (from, CaseStatus::Resolved | CaseStatus::Closed) => from.is_open(),
            _ => false,
        }
    }
}

/// A legal case opened over a defaulted installment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalCase {
    /// The case identifier.
    pub id: CaseId,
    /// The plot under dispute.
    pub plot_id: PlotId,
    /// The defaulted installment, when the case was opened by the sweep.
    pub installment_id: Option<InstallmentId>,
    /// Amount in default.
    pub amount: Money,
    /// Date the default was recorded.
    pub opened_on: NaiveDate,
    /// End of the grace window that preceded this case.
    pub grace_period_end: NaiveDate,
    /// Current case status.
    pub status: CaseStatus,
    /// Scheduled court date, once filed.
    pub court_date: Option<NaiveDate>,
    /// Who filed the case.
    pub filed_by: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the PlotLedger engine.
///
/// - No silent failures
/// - Use `Result<T, LedgerError>` for fallible operations
/// - The engine never panics; all errors are recoverable
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The requested plot does not exist.
    #[error("Plot not found: {0:?}")]
    PlotNotFound(PlotId),

    /// The requested schedule does not exist.
    #[error("Schedule not found: {0:?}")]
    ScheduleNotFound(ScheduleId),

    /// The requested installment does not exist.
    #[error("Installment not found: {0:?}")]
    InstallmentNotFound(InstallmentId),

    /// The requested document does not exist.
    #[error("Document not found: {0:?}")]
    DocumentNotFound(DocumentId),

    /// The requested case does not exist.
    #[error("Case not found: {0:?}")]
    CaseNotFound(CaseId),

    /// The plot already has a schedule. Schedules are immutable once created.
    #[error("Plot {0:?} already has a payment schedule")]
    ScheduleExists(PlotId),

    /// The schedule request failed validation.
    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    /// The payment request failed validation.
    #[error("Invalid payment: {0}")]
    InvalidPayment(String),

    /// The requested state transition is not legal.
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_saturating_add() {
        let max = Money::new(i64::MAX);
        assert_eq!(max.saturating_add(Money::new(1)).value(), i64::MAX);
        assert_eq!(Money::new(2).saturating_add(Money::new(3)).value(), 5);
    }

    #[test]
    fn payment_status_payable() {
        assert!(PaymentStatus::Pending.is_payable());
        assert!(PaymentStatus::Overdue.is_payable());
        assert!(!PaymentStatus::Paid.is_payable());
        assert!(!PaymentStatus::Failed.is_payable());
    }

    #[test]
    fn case_transitions_forward_only() {
        assert!(CaseStatus::Recorded.can_transition_to(CaseStatus::Filed));
        assert!(CaseStatus::Filed.can_transition_to(CaseStatus::InProgress));
        assert!(CaseStatus::InProgress.can_transition_to(CaseStatus::Resolved));
        assert!(CaseStatus::Recorded.can_transition_to(CaseStatus::Closed));

        assert!(!CaseStatus::Filed.can_transition_to(CaseStatus::Recorded));
        assert!(!CaseStatus::Resolved.can_transition_to(CaseStatus::Filed));
        assert!(!CaseStatus::Closed.can_transition_to(CaseStatus::Resolved));
    }

    #[test]
    fn case_open_states() {
        assert!(CaseStatus::Recorded.is_open());
        assert!(CaseStatus::InProgress.is_open());
        assert!(!CaseStatus::Resolved.is_open());
        assert!(!CaseStatus::Closed.is_open());
    }

    #[test]
    fn money_display() {
        assert_eq!(format!("{}", Money::new(500_000)), "PKR 500000");
    }
}
