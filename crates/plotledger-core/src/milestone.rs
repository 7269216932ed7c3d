//! # Milestone Assessment
//!
//! Payment milestones are four fixed completion thresholds that gate the
//! issuance of legal documents:
//!
//! | Milestone | Threshold | Document |
//! |-----------|-----------|----------------------|
//! | Allotment | 10% paid | Allotment Document |
//! | Allocation | 50% paid | Allocation Document |
//! | Possession | 75% paid | Possession Document |
//! | Clearance | 100% paid | Clearance Certificate|
//!
//! The milestone is a derived value, never stored: it is recomputed from the
//! ratio of paid installment amounts to the schedule total on every request.
//! The mapping is an ordered threshold scan with closed lower bounds - a plot
//! at 60% sits at Allocation, not a partial state between Allocation and
//! Possession.
//!
//! All arithmetic is integer-only. Percentages are rounded to the nearest
//! whole percent and clamped to 100.

use crate::types::{Money, PaymentInstallment, PaymentStatus};
use serde::{Deserialize, Serialize};

// =============================================================================
// MILESTONE THRESHOLDS
// =============================================================================

/// Threshold for the Allotment milestone.
pub const ALLOTMENT_THRESHOLD: u8 = 10;

/// Threshold for the Allocation milestone.
pub const ALLOCATION_THRESHOLD: u8 = 50;

/// Threshold for the Possession milestone.
pub const POSSESSION_THRESHOLD: u8 = 75;

/// Threshold for the Clearance milestone.
pub const CLEARANCE_THRESHOLD: u8 = 100;

// =============================================================================
// MILESTONE ENUM
// =============================================================================

/// The highest payment milestone a plot has reached.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Milestone {
    /// Below 10% paid. No document is due yet.
    #[default]
    None,
    /// At least 10% paid.
    Allotment,
    /// At least 50% paid.
    Allocation,
    /// At least 75% paid.
    Possession,
    /// Fully paid.
    Clearance,
}

impl Milestone {
    /// All milestones that gate a document, in ascending order.
    pub const GATED: [Milestone; 4] = [
        Milestone::Allotment,
        Milestone::Allocation,
        Milestone::Possession,
        Milestone::Clearance,
    ];

    /// Get the milestone name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Milestone::None => "None",
            Milestone::Allotment => "Allotment",
            Milestone::Allocation => "Allocation",
            Milestone::Possession => "Possession",
            Milestone::Clearance => "Clearance",
        }
    }

    /// Get the percentage threshold for this milestone.
    #[must_use]
    pub fn level(&self) -> u8 {
        match self {
            Milestone::None => 0,
            Milestone::Allotment => ALLOTMENT_THRESHOLD,
            Milestone::Allocation => ALLOCATION_THRESHOLD,
            Milestone::Possession => POSSESSION_THRESHOLD,
            Milestone::Clearance => CLEARANCE_THRESHOLD,
        }
    }

    /// Map a payment percentage to the highest qualifying milestone.
    ///
    /// Ordered threshold scan with closed lower bounds: 49 maps to
    /// Allotment, 50 maps to Allocation.
    #[must_use]
    pub fn from_percentage(percentage: u8) -> Milestone {
        if percentage >= CLEARANCE_THRESHOLD {
            Milestone::Clearance
        } else if percentage >= POSSESSION_THRESHOLD {
            Milestone::Possession
        } else if percentage >= ALLOCATION_THRESHOLD {
            Milestone::Allocation
        } else if percentage >= ALLOTMENT_THRESHOLD {
            Milestone::Allotment
        } else {
            Milestone::None
        }
    }

    /// Get the next milestone, if any.
    #[must_use]
    pub fn next(&self) -> Option<Milestone> {
        match self {
            Milestone::None => Some(Milestone::Allotment),
            Milestone::Allotment => Some(Milestone::Allocation),
            Milestone::Allocation => Some(Milestone::Possession),
            Milestone::Possession => Some(Milestone::Clearance),
            Milestone::Clearance => None,
        }
    }

    /// Get the previous milestone, if any.
    #[must_use]
    pub fn previous(&self) -> Option<Milestone> {
        match self {
            Milestone::None => None,
            Milestone::Allotment => Some(Milestone::None),
            Milestone::Allocation => Some(Milestone::Allotment),
            Milestone::Possession => Some(Milestone::Allocation),
            Milestone::Clearance => Some(Milestone::Possession),
        }
    }

    /// Check if this milestone is terminal (Clearance).
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Milestone::Clearance)
    }
}

impl std::fmt::Display for Milestone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}% - {}", self.level(), self.name())
    }
}

// =============================================================================
// PAYMENT PROGRESS
// =============================================================================

/// Derived payment progress for a plot.
///
/// Never persisted; recomputed fresh from the schedule and its installments
/// on every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentProgress {
    /// Percentage of the schedule total that has been paid, 0..=100.
    pub percentage: u8,
    /// The highest milestone reached at that percentage.
    pub milestone: Milestone,
    /// Sum of paid installment amounts.
    pub total_paid: Money,
    /// The schedule total.
    pub total_due: Money,
}

impl PaymentProgress {
    /// The degenerate result for a plot with no schedule.
    ///
    /// This is a policy decision, not an error: an unscheduled plot is
    /// simply at 0%.
    #[must_use]
    pub fn unscheduled() -> Self {
        Self {
            percentage: 0,
            milestone: Milestone::None,
            total_paid: Money::ZERO,
            total_due: Money::ZERO,
        }
    }

    /// Assess progress from a schedule total and its installments.
    ///
    /// Sums the amounts of installments in Paid status, divides by the
    /// schedule total, and rounds to the nearest whole percent. A
    /// non-positive total yields the degenerate zero result. Infallible,
    /// no side effects.
    #[must_use]
    pub fn assess(total: Money, installments: &[PaymentInstallment]) -> Self {
        if !total.is_positive() {
            return Self::unscheduled();
        }

        let paid = installments
            .iter()
            .filter(|i| i.status == PaymentStatus::Paid)
            .fold(Money::ZERO, |sum, i| sum.saturating_add(i.amount));

        let percentage = ratio_percent(paid, total);

        Self {
            percentage,
            milestone: Milestone::from_percentage(percentage),
            total_paid: paid,
            total_due: total,
        }
    }

    /// The milestones newly earned when progress moves from `before` to
    /// `self`, in ascending order.
    #[must_use]
    pub fn milestones_crossed(&self, before: &PaymentProgress) -> Vec<Milestone> {
        Milestone::GATED
            .iter()
            .copied()
            .filter(|m| *m > before.milestone && *m <= self.milestone)
            .collect()
    }
}

/// Integer percentage of `paid` over `total`, rounded to nearest, clamped
/// to 0..=100. Caller guarantees `total > 0`.
fn ratio_percent(paid: Money, total: Money) -> u8 {
    let paid = i128::from(paid.value().max(0));
    let total = i128::from(total.value());
    // round(paid * 100 / total) via (paid * 200 + total) / (2 * total)
    let pct = (paid * 200 + total) / (total * 2);
    pct.clamp(0, 100) as u8
}

// =============================================================================
// TESTS
// =============================================================================
