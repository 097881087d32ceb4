//! # Pinduct Kernel
//!
//! Bottom-up predicate induction: find a small, non-redundant set of
//! conjunctive region predicates whose covered records score above a
//! threshold under a caller-supplied scorer.
//!
//! This crate is **backend-agnostic**: it does not prescribe how records are
//! stored, bucketed, or scored. It only prescribes how predicates over them
//! are generated, compared, and admitted.
//!
//! ## Architecture
//!
//! ```text
//! Backend / Scorer      ← External collaborators (dimensions, coverage, quality)
//!     │
//! Constraint            ← Canonical per-dimension value sets
//!     │
//! Predicate             ← Conjunction of constraints; cached coverage + score
//!     │
//! SearchSession         ← Frontier / Accepted / Rejected sweep loop
//!     │
//! conditional_merge     ← Greedy rescue of the residual frontier
//!     │
//! select_final          ← Accepted ∪ conditionally accepted, antichain
//! ```

pub mod backend;
pub mod conditional;
pub mod config;
pub mod constraint;
pub mod coverage;
pub mod error;
pub mod outcome;
pub mod predicate;
pub mod scored;
pub mod scorer;
pub mod search;
pub mod select;

pub use backend::{Backend, Dimension, DimensionKind};
pub use conditional::{ConditionalMerge, conditional_merge};
pub use config::SearchConfig;
pub use constraint::Constraint;
pub use coverage::Coverage;
pub use error::{InductionError, MergeError, ScoreError};
pub use outcome::{
    FinalPredicate, Provenance, RejectReason, Rejection, SearchOutcome, Termination,
};
pub use predicate::{Fingerprint, MergeMode, Predicate};
pub use scored::{Scored, Sequence};
pub use scorer::Scorer;
pub use search::{SearchSession, induce};
pub use select::{Selected, select_final};
