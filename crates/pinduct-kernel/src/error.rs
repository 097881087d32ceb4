//! Error types for kernel operations.

use crate::backend::Dimension;

/// Errors that abort a search.
#[derive(Debug, thiserror::Error)]
pub enum InductionError {
    /// The search configuration failed validation.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// The configuration could not be parsed.
    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The scorer failed on a coverage set. Never retried.
    #[error(transparent)]
    Score(#[from] ScoreError),

    /// The backend could not evaluate a predicate.
    #[error("backend error: {0}")]
    Backend(String),

    /// Two residual predicates could not be merged.
    #[error(transparent)]
    Merge(#[from] MergeError),

    /// A predicate referenced a dimension the backend does not know.
    #[error("unknown dimension: {0}")]
    UnknownDimension(Dimension),
}

/// A failure reported by a [`Scorer`](crate::scorer::Scorer).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoreError {
    /// The scorer produced NaN, which has no place in the score ordering.
    #[error("scorer returned NaN for a coverage of {support} records")]
    NotANumber { support: usize },

    /// Scorer-specific failure.
    #[error("scorer failed: {0}")]
    Failed(String),
}

/// Misuse of [`Predicate::merge`](crate::predicate::Predicate::merge).
///
/// Local to one candidate pair. The search driver never constructs such
/// pairs, so these only surface to direct callers of `merge`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
    /// Expand requires both operands to constrain the same dimensions.
    #[error("expand across differing signatures: {left:?} vs {right:?}")]
    SignatureMismatch {
        left: Vec<Dimension>,
        right: Vec<Dimension>,
    },

    /// Refine may only add dimensions the left operand leaves open.
    #[error("refine along already-constrained dimension {0}")]
    AlreadyConstrained(Dimension),

    /// The two constraints on a dimension are of different kinds.
    #[error("constraint kind mismatch on dimension {0}")]
    KindMismatch(Dimension),
}
