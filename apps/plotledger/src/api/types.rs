//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.
//!
//! Responses follow the `success`/`error` envelope convention: every
//! mutating endpoint returns a typed response with a `success` flag and
//! an optional `error` message, so clients never have to parse free-form
//! error bodies.

use chrono::NaiveDate;
use plotledger_core::{
    AuditEntry, CaseStatus, DocumentSlot, InstallmentSpec, LedgerError, LegalCase, Milestone,
    MilestoneDocument, Money, NewPlot, PaymentInstallment, PaymentOutcome, PaymentProgress,
    PaymentSchedule, Plot, SweepOutcome,
    limits::{MAX_INSTALLMENTS, MAX_LABEL_LENGTH, MAX_URI_LENGTH},
};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Ledger status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub plot_count: usize,
    pub schedule_count: usize,
    pub document_count: usize,
    pub open_case_count: usize,
}

// =============================================================================
// PLOT REQUEST/RESPONSE
// =============================================================================

/// Plot registration request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterPlotRequest {
    pub plot_number: String,
    pub area: String,
    pub location: String,
    /// Total sale value in whole rupees.
    pub total_value: i64,
    /// Registration date; the server's current date when omitted.
    pub registered_on: Option<NaiveDate>,
}

impl RegisterPlotRequest {
    /// Convert to a NewPlot, validating fields.
    ///
    /// Length limits are enforced here so oversized payloads are rejected
    /// at the API boundary, before data reaches the Core operations.
    pub fn to_new_plot(&self) -> Result<NewPlot, LedgerError> {
        for (field, value) in [
            ("plot_number", &self.plot_number),
            ("area", &self.area),
            ("location", &self.location),
        ] {
            if value.trim().is_empty() {
                return Err(LedgerError::InvalidSchedule(format!(
                    "{} must not be empty",
                    field
                )));
            }
            if value.len() > MAX_LABEL_LENGTH {
                return Err(LedgerError::InvalidSchedule(format!(
                    "{} length {} exceeds maximum {} bytes",
                    field,
                    value.len(),
                    MAX_LABEL_LENGTH
                )));
            }
        }

        if self.total_value <= 0 {
            return Err(LedgerError::InvalidSchedule(
                "total_value must be positive".to_string(),
            ));
        }

        Ok(NewPlot {
            plot_number: self.plot_number.clone(),
            area: self.area.clone(),
            location: self.location.clone(),
            total_value: Money::new(self.total_value),
        })
    }
}

/// Single-plot response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotResponse {
    pub success: bool,
    pub plot: Option<Plot>,
    pub error: Option<String>,
}

impl PlotResponse {
    pub fn success(plot: Plot) -> Self {
        Self {
            success: true,
            plot: Some(plot),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            plot: None,
            error: Some(msg.into()),
        }
    }
}

/// Plot listing response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotListResponse {
    pub success: bool,
    pub plots: Vec<Plot>,
    pub error: Option<String>,
}

impl PlotListResponse {
    pub fn success(plots: Vec<Plot>) -> Self {
        Self {
            success: true,
            plots,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            plots: vec![],
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// SCHEDULE REQUEST/RESPONSE
// =============================================================================

/// One requested installment within a schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallmentSpecJson {
    /// Amount due in whole rupees.
    pub amount: i64,
    pub due_date: NaiveDate,
}

/// Schedule creation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScheduleRequest {
    /// Total obligation in whole rupees.
    pub total_amount: i64,
    /// Up-front portion, recorded as installment 1.
    pub down_payment: i64,
    pub installments: Vec<InstallmentSpecJson>,
    /// Creation date; the server's current date when omitted.
    pub created_on: Option<NaiveDate>,
}

impl CreateScheduleRequest {
    /// Convert to installment specs, validating the request shape.
    ///
    /// Amount arithmetic (down + installments == total) is validated by
    /// the Core; this only rejects payloads that are structurally wrong.
    /// An empty array is allowed: a down payment covering the full total
    /// is a valid one-installment schedule.
    pub fn to_specs(&self) -> Result<Vec<InstallmentSpec>, LedgerError> {
        if self.installments.len() > MAX_INSTALLMENTS {
            return Err(LedgerError::InvalidSchedule(format!(
                "installment count {} exceeds maximum {}",
                self.installments.len(),
                MAX_INSTALLMENTS
            )));
        }

        Ok(self
            .installments
            .iter()
            .map(|spec| InstallmentSpec {
                amount: Money::new(spec.amount),
                due_date: spec.due_date,
            })
            .collect())
    }
}

/// Schedule response carrying the schedule, its installments and the
/// freshly derived progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleResponse {
    pub success: bool,
    pub schedule: Option<PaymentSchedule>,
    pub installments: Vec<PaymentInstallment>,
    pub progress: Option<PaymentProgress>,
    pub error: Option<String>,
}

impl ScheduleResponse {
    pub fn success(
        schedule: PaymentSchedule,
        installments: Vec<PaymentInstallment>,
        progress: PaymentProgress,
    ) -> Self {
        Self {
            success: true,
            schedule: Some(schedule),
            installments,
            progress: Some(progress),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            schedule: None,
            installments: vec![],
            progress: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// PROGRESS RESPONSE
// =============================================================================

/// Derived payment progress for a plot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressResponse {
    pub success: bool,
    pub percentage: u8,
    pub milestone: Milestone,
    pub milestone_level: u8,
    pub total_paid: i64,
    pub total_due: i64,
    pub error: Option<String>,
}

impl ProgressResponse {
    pub fn success(progress: &PaymentProgress) -> Self {
        Self {
            success: true,
            percentage: progress.percentage,
            milestone: progress.milestone,
            milestone_level: progress.milestone.level(),
            total_paid: progress.total_paid.value(),
            total_due: progress.total_due.value(),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            percentage: 0,
            milestone: Milestone::None,
            milestone_level: 0,
            total_paid: 0,
            total_due: 0,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// PAYMENT REQUEST/RESPONSE
// =============================================================================

/// Payment recording request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayRequest {
    /// Payment date; the server's current date when omitted.
    pub paid_on: Option<NaiveDate>,
    /// Optional receipt reference.
    pub receipt_uri: Option<String>,
}

impl PayRequest {
    /// Validate the receipt URI length at the API boundary.
    pub fn validated_uri(&self) -> Result<Option<String>, LedgerError> {
        if let Some(uri) = &self.receipt_uri
            && uri.len() > MAX_URI_LENGTH
        {
            return Err(LedgerError::InvalidPayment(format!(
                "receipt_uri length {} exceeds maximum {} bytes",
                uri.len(),
                MAX_URI_LENGTH
            )));
        }
        Ok(self.receipt_uri.clone())
    }
}

/// Payment recording response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayResponse {
    pub success: bool,
    pub installment: Option<PaymentInstallment>,
    pub progress: Option<PaymentProgress>,
    /// The highest milestone newly crossed by this payment, if any.
    pub milestone_reached: Option<Milestone>,
    pub error: Option<String>,
}

impl PayResponse {
    pub fn success(outcome: PaymentOutcome) -> Self {
        Self {
            success: true,
            installment: Some(outcome.installment),
            progress: Some(outcome.progress),
            milestone_reached: outcome.milestone_reached,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            installment: None,
            progress: None,
            milestone_reached: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// SWEEP REQUEST/RESPONSE
// =============================================================================

/// Overdue sweep request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepRequest {
    /// Sweep reference date; the server's current date when omitted.
    pub today: Option<NaiveDate>,
}

/// Overdue sweep response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepResponse {
    pub success: bool,
    pub marked_overdue: usize,
    pub cases_opened: usize,
    pub error: Option<String>,
}

impl SweepResponse {
    pub fn success(outcome: &SweepOutcome) -> Self {
        Self {
            success: true,
            marked_overdue: outcome.marked_overdue.len(),
            cases_opened: outcome.cases_opened.len(),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            marked_overdue: 0,
            cases_opened: 0,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// DOCUMENT REQUEST/RESPONSE
// =============================================================================

/// Document board response: the four fixed slots for a plot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentBoardResponse {
    pub success: bool,
    pub reached: Milestone,
    pub slots: Vec<DocumentSlot>,
    pub error: Option<String>,
}

impl DocumentBoardResponse {
    pub fn success(reached: Milestone, slots: Vec<DocumentSlot>) -> Self {
        Self {
            success: true,
            reached,
            slots,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            reached: Milestone::None,
            slots: vec![],
            error: Some(msg.into()),
        }
    }
}

/// Document issuance request (attaches a generated URI).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueDocumentRequest {
    pub uri: String,
    /// Issuance date; the server's current date when omitted.
    pub issued_on: Option<NaiveDate>,
}

/// Document approval request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApproveDocumentRequest {
    pub approved_by: String,
    /// Approval date; the server's current date when omitted.
    pub approved_on: Option<NaiveDate>,
}

/// Single-document response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentResponse {
    pub success: bool,
    pub document: Option<MilestoneDocument>,
    pub error: Option<String>,
}

impl DocumentResponse {
    pub fn success(document: MilestoneDocument) -> Self {
        Self {
            success: true,
            document: Some(document),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            document: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// CASE REQUEST/RESPONSE
// =============================================================================

/// Case listing response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseListResponse {
    pub success: bool,
    pub cases: Vec<LegalCase>,
    pub error: Option<String>,
}

impl CaseListResponse {
    pub fn success(cases: Vec<LegalCase>) -> Self {
        Self {
            success: true,
            cases,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            cases: vec![],
            error: Some(msg.into()),
        }
    }
}

/// Case transition request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCaseRequest {
    pub status: CaseStatus,
    pub court_date: Option<NaiveDate>,
    pub filed_by: Option<String>,
    /// Transition date; the server's current date when omitted.
    pub updated_on: Option<NaiveDate>,
}

/// Single-case response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseResponse {
    pub success: bool,
    pub case: Option<LegalCase>,
    pub error: Option<String>,
}

impl CaseResponse {
    pub fn success(case: LegalCase) -> Self {
        Self {
            success: true,
            case: Some(case),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            case: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// AUDIT RESPONSE
// =============================================================================

/// Audit trail response, newest entries first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditResponse {
    pub success: bool,
    pub entries: Vec<AuditEntry>,
    pub error: Option<String>,
}

impl AuditResponse {
    pub fn success(entries: Vec<AuditEntry>) -> Self {
        Self {
            success: true,
            entries,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            entries: vec![],
            error: Some(msg.into()),
        }
    }
}
