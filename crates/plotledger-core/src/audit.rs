//! # Audit Log
//!
//! Append-only record of every state change the engine performs. Entries
//! carry a monotonically increasing sequence number; queries return the most
//! recent entries first.

use crate::types::PlotId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The action an audit entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A plot was registered.
    PlotRegistered,
    /// A plot's sale status changed.
    PlotStatusChanged,
    /// A payment schedule was created.
    ScheduleCreated,
    /// An installment payment was recorded.
    PaymentReceived,
    /// A payment milestone was crossed.
    MilestoneReached,
    /// A document was generated and given a URI.
    DocumentIssued,
    /// A document was approved.
    DocumentApproved,
    /// The sweep marked an installment overdue.
    PaymentOverdue,
    /// A legal case was opened.
    CaseOpened,
    /// A legal case changed status.
    CaseUpdated,
}

impl AuditAction {
    /// Get the action as a wire string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::PlotRegistered => "plot_registered",
            AuditAction::PlotStatusChanged => "plot_status_changed",
            AuditAction::ScheduleCreated => "schedule_created",
            AuditAction::PaymentReceived => "payment_received",
            AuditAction::MilestoneReached => "milestone_reached",
            AuditAction::DocumentIssued => "document_issued",
            AuditAction::DocumentApproved => "document_approved",
            AuditAction::PaymentOverdue => "payment_overdue",
            AuditAction::CaseOpened => "case_opened",
            AuditAction::CaseUpdated => "case_updated",
        }
    }
}

/// One entry in the append-only audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Position in the log, starting at 1. Never reused.
    pub seq: u64,
    /// Date the action happened (caller-supplied; the engine has no clock).
    pub on: NaiveDate,
    /// What happened.
    pub action: AuditAction,
    /// The plot involved, when the action concerns one.
    pub plot: Option<PlotId>,
    /// Human-readable detail, e.g. "installment 3 paid, PKR 100000".
    pub detail: String,
}
