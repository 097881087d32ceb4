//! The dataset collaborator.
//!
//! A backend owns the records. The kernel never looks at rows directly:
//! it asks the backend which dimensions exist, which base values each
//! dimension offers, which values are adjacent for expand-merges, and
//! which records a set of constraints covers.
//!
//! Adjacency is always explicit. For nominal dimensions the kernel does not
//! assume that every pair of categories is adjacent; a backend that wants
//! that behavior has to say so.

use crate::constraint::Constraint;
use crate::coverage::Coverage;
use crate::error::InductionError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifier for one attribute axis of the dataset.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dimension(pub String);

impl Dimension {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a dimension's values carry an order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DimensionKind {
    /// Values are ranks; constraints are interval sets.
    Ordinal,

    /// Values are unordered category codes; constraints are category sets.
    Nominal,
}

impl DimensionKind {
    /// The single-value constraint a base predicate carries on this kind.
    pub fn unit(self, value: u32) -> Constraint {
        match self {
            Self::Ordinal => Constraint::range(value, value),
            Self::Nominal => Constraint::categories([value]),
        }
    }
}

impl std::fmt::Display for DimensionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ordinal => write!(f, "ordinal"),
            Self::Nominal => write!(f, "nominal"),
        }
    }
}

/// The dataset interface the search runs against.
///
/// Implementations must be pure with respect to a fixed dataset:
/// `coverage` of the same constraints always yields the same records.
pub trait Backend: Send + Sync {
    /// All searchable dimensions, in the order the search visits them.
    fn dimensions(&self) -> Vec<Dimension>;

    /// Kind of a dimension, or `None` if the backend does not know it.
    fn kind(&self, dimension: &Dimension) -> Option<DimensionKind>;

    /// Value codes that become single-value base predicates, in order.
    fn base_values(&self, dimension: &Dimension) -> Vec<u32>;

    /// Values adjacent to `value` along `dimension`.
    fn adjacent(&self, dimension: &Dimension, value: u32) -> Vec<u32>;

    /// Records satisfying every constraint.
    fn coverage(
        &self,
        constraints: &BTreeMap<Dimension, Constraint>,
    ) -> Result<Coverage, InductionError>;

    /// Number of records in the dataset.
    fn record_count(&self) -> usize;

    /// Human-readable label for a value code.
    fn label(&self, dimension: &Dimension, value: u32) -> String {
        let _ = dimension;
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_constraint_follows_kind() {
        assert_eq!(DimensionKind::Ordinal.unit(3), Constraint::range(3, 3));
        assert_eq!(DimensionKind::Nominal.unit(3), Constraint::categories([3]));
    }

    #[test]
    fn dimension_serializes_as_plain_string() {
        let json = serde_json::to_string(&Dimension::new("age")).unwrap();
        assert_eq!(json, "\"age\"");
    }
}
