//! # plotledger-core
//!
//! The deterministic plot-sales ledger engine for PlotLedger - THE LOGIC.
//!
//! This crate implements the domain substrate of a plot-sales management
//! system: plots, payment schedules, installments, milestone documents,
//! legal cases and the audit trail, together with the two pure derivations
//! that drive the purchaser experience - milestone assessment and the
//! document gate.
//!
//! ## Architectural Constraints
//!
//! The CORE:
//! - Is the ONLY place where domain state exists (stateful)
//! - Never stores a derived value: milestones and document availability
//!   are recomputed from records on every read
//! - Performs integer arithmetic only; money is whole rupees
//! - Has NO clock: callers supply every date
//! - Has NO async, NO network dependencies (pure Rust)

// =============================================================================
// MODULES
// =============================================================================

pub mod audit;
pub mod documents;
pub mod ledger;
pub mod limits;
pub mod milestone;
pub mod ops;
pub mod session;
pub mod storage;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    CaseId, CaseStatus, DocumentId, DocumentStatus, InstallmentId, LedgerError, LegalCase,
    MilestoneDocument, Money, NewPlot, PaymentInstallment, PaymentSchedule, PaymentStatus, Plot,
    PlotId, PlotStatus, ScheduleId,
};

// =============================================================================
// RE-EXPORTS: Ledger Engine
// =============================================================================

pub use audit::{AuditAction, AuditEntry};
pub use documents::{
    DocumentAvailability, DocumentKind, DocumentSlot, availability, document_board,
};
pub use ledger::{Ledger, LedgerStore};
pub use milestone::{
    ALLOCATION_THRESHOLD, ALLOTMENT_THRESHOLD, CLEARANCE_THRESHOLD, Milestone, PaymentProgress,
    POSSESSION_THRESHOLD,
};
pub use ops::{InstallmentSpec, Operations, PaymentOutcome, SweepOutcome};
pub use session::{Session, StorageBackend};
pub use storage::RedbLedger;
