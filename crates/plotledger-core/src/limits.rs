//! # Engine Constants
//!
//! Hardcoded runtime constants for the PlotLedger CORE.
//!
//! The engine starts with zero data but fixed policy. These values are
//! compiled into the binary and are immutable at runtime.

/// Days between an installment turning Overdue and its escalation to Failed.
///
/// The overdue sweep opens a legal case when `due_date + GRACE_PERIOD_DAYS`
/// has passed without payment.
pub const GRACE_PERIOD_DAYS: i64 = 30;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum number of installments in a single payment schedule.
///
/// Schedules longer than this (30 years of monthly payments) are rejected
/// at creation time.
pub const MAX_INSTALLMENTS: usize = 360;

/// Maximum length for receipt and document URIs.
///
/// Longer URIs are rejected to prevent memory exhaustion from malformed
/// input.
pub const MAX_URI_LENGTH: usize = 2048;

/// Maximum length for label strings (plot numbers, locations, names).
pub const MAX_LABEL_LENGTH: usize = 256;

/// Maximum number of audit entries returned by a single query.
pub const MAX_AUDIT_QUERY: usize = 1000;
