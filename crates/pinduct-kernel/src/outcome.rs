//! Search results.
//!
//! Everything a caller gets back from a search: the final predicates with
//! their provenance, and a ledger explaining every rejection in the order
//! it happened. Two runs over identical input produce identical outcomes,
//! ledger included.

use crate::predicate::{Fingerprint, Predicate};
use serde::{Deserialize, Serialize};

/// Which set a final predicate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Locally maximal and above `threshold`.
    Accepted,

    /// Rescued from the residual frontier, above `conditional_threshold`.
    ConditionallyAccepted,
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accepted => write!(f, "accepted"),
            Self::ConditionallyAccepted => write!(f, "conditionally_accepted"),
        }
    }
}

/// One predicate of the final result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalPredicate {
    pub predicate: Predicate,
    pub score: f64,
    /// Number of covered records.
    pub support: usize,
    pub provenance: Provenance,
    pub fingerprint: Fingerprint,
}

/// Why a predicate landed in the rejected set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RejectReason {
    /// Locally maximal but not above `threshold`.
    BelowThreshold,

    /// An accepted predicate contains it and scores strictly higher.
    Dominated { by: Fingerprint },

    /// It contains an accepted predicate scoring at least as high.
    SubsumesBetter { containee: Fingerprint },

    /// Was accepted, then displaced by a later admission.
    Evicted { by: Fingerprint },
}

/// One entry of the rejection ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    pub fingerprint: Fingerprint,
    pub predicate: Predicate,
    pub score: f64,
    /// Sweep during which the rejection happened, starting at 1.
    pub sweep: usize,
    pub reason: RejectReason,
}

/// Why the sweep loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The frontier emptied.
    Exhausted,

    /// `max_iters` sweeps ran with frontier left over.
    IterationCap,

    /// The wall-clock budget ran out at a sweep boundary.
    Deadline,
}

impl Termination {
    /// Whether the search ran to a fixpoint rather than hitting a cap.
    pub fn is_complete(self) -> bool {
        matches!(self, Self::Exhausted)
    }
}

/// The result of one search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Final predicates, descending score, stable by insertion order.
    pub predicates: Vec<FinalPredicate>,

    /// Size of the accepted set before final selection.
    pub accepted: usize,

    /// Size of the conditionally accepted set before final selection.
    pub conditionally_accepted: usize,

    /// Residual predicates that reached the conditional merge.
    pub residual: usize,

    /// Residual merge results at or below `conditional_threshold`.
    pub discarded: usize,

    /// Rejections in the order they were decided.
    pub rejected: Vec<Rejection>,

    pub sweeps: usize,
    pub termination: Termination,
}

impl SearchOutcome {
    pub fn is_complete(&self) -> bool {
        self.termination.is_complete()
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}
