//! # Document Gate
//!
//! Classifies each of the four fixed milestone documents for a plot into one
//! of three visibility states:
//!
//! - **Available**: the document has been generated and has a storage URI.
//! - **Pending**: the gating milestone is reached but nothing is issued yet.
//! - **Locked**: the purchaser has not paid far enough to unlock it.
//!
//! The gate is a pure three-way classification over (milestone reached,
//! milestone required, URI present). It never mutates anything and never
//! fails; every input combination maps to exactly one state.

use crate::milestone::Milestone;
use crate::types::{MilestoneDocument, PlotId};
use serde::{Deserialize, Serialize};

// =============================================================================
// DOCUMENT KIND
// =============================================================================

/// One of the four fixed documents issued over the life of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Issued at 10% paid.
    Allotment,
    /// Issued at 50% paid.
    Allocation,
    /// Issued at 75% paid.
    Possession,
    /// Issued at full payment.
    Clearance,
}

impl DocumentKind {
    /// All document kinds, in milestone order.
    pub const ALL: [DocumentKind; 4] = [
        DocumentKind::Allotment,
        DocumentKind::Allocation,
        DocumentKind::Possession,
        DocumentKind::Clearance,
    ];

    /// The payment milestone that gates this document.
    #[must_use]
    pub fn milestone(&self) -> Milestone {
        match self {
            DocumentKind::Allotment => Milestone::Allotment,
            DocumentKind::Allocation => Milestone::Allocation,
            DocumentKind::Possession => Milestone::Possession,
            DocumentKind::Clearance => Milestone::Clearance,
        }
    }

    /// The document kind created when a milestone is crossed.
    #[must_use]
    pub fn for_milestone(milestone: Milestone) -> Option<DocumentKind> {
        match milestone {
            Milestone::None => None,
            Milestone::Allotment => Some(DocumentKind::Allotment),
            Milestone::Allocation => Some(DocumentKind::Allocation),
            Milestone::Possession => Some(DocumentKind::Possession),
            Milestone::Clearance => Some(DocumentKind::Clearance),
        }
    }

    /// Human-facing document title.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            DocumentKind::Allotment => "Allotment Document",
            DocumentKind::Allocation => "Allocation Document",
            DocumentKind::Possession => "Possession Document",
            DocumentKind::Clearance => "Clearance Certificate",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

// =============================================================================
// AVAILABILITY
// =============================================================================

/// Visibility state of one document slot on the purchaser's board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentAvailability {
    /// Generated with a URI; can be viewed or downloaded.
    Available,
    /// Milestone reached, issuance outstanding.
    Pending,
    /// Gating milestone not yet reached.
    Locked,
}

impl DocumentAvailability {
    /// Get the availability as a wire string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentAvailability::Available => "available",
            DocumentAvailability::Pending => "pending",
            DocumentAvailability::Locked => "locked",
        }
    }
}

/// Classify one document slot.
///
/// A URI always wins: an issued document stays Available even if the
/// derived milestone were to change. Otherwise the reached milestone is
/// compared against the kind's gating milestone.
#[must_use]
pub fn availability(
    reached: Milestone,
    kind: DocumentKind,
    has_uri: bool,
) -> DocumentAvailability {
    if has_uri {
        DocumentAvailability::Available
    } else if reached >= kind.milestone() {
        DocumentAvailability::Pending
    } else {
        DocumentAvailability::Locked
    }
}

// =============================================================================
// DOCUMENT BOARD
// =============================================================================

/// One slot on a plot's document board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSlot {
    /// Which of the four documents this slot is for.
    pub kind: DocumentKind,
    /// The milestone percentage that unlocks the slot.
    pub required_level: u8,
    /// Derived visibility for the purchaser.
    pub availability: DocumentAvailability,
    /// The stored document record, once the milestone has been crossed.
    pub document: Option<MilestoneDocument>,
}

/// Derive the four-slot document board for a plot.
///
/// `documents` is whatever the ledger holds for the plot; slots without a
/// stored record are derived purely from the reached milestone. Always
/// returns exactly four slots, in milestone order.
#[must_use]
pub fn document_board(
    plot_id: PlotId,
    reached: Milestone,
    documents: &[MilestoneDocument],
) -> Vec<DocumentSlot> {
    DocumentKind::ALL
        .iter()
        .map(|&kind| {
            let document = documents
                .iter()
                .find(|d| d.plot_id == plot_id && d.kind == kind)
                .cloned();
            let has_uri = document
                .as_ref()
                .is_some_and(|d| d.generated_uri.is_some());
            DocumentSlot {
                kind,
                required_level: kind.milestone().level(),
                availability: availability(reached, kind, has_uri),
                document,
            }
        })
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================
