//! Per-dimension constraints.
//!
//! A constraint is the set of value codes a predicate admits on one
//! dimension. Both representations are canonical: ordinal constraints are
//! sorted, disjoint, non-touching inclusive intervals; nominal constraints
//! are sorted category sets. Two constraints admitting the same values are
//! therefore equal, hash equally, and order equally, regardless of the
//! merge sequence that produced them.

use crate::backend::DimensionKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Value set admitted on one dimension.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "RawConstraint", rename_all = "snake_case", tag = "kind")]
pub enum Constraint {
    /// Inclusive `[lo, hi]` rank intervals over an ordinal dimension.
    Ranges { ranges: Vec<(u32, u32)> },

    /// Category codes over a nominal dimension.
    Categories { values: BTreeSet<u32> },
}

/// Unnormalized wire form; deserialization always goes through the
/// canonicalizing constructors.
#[derive(Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
enum RawConstraint {
    Ranges { ranges: Vec<(u32, u32)> },
    Categories { values: Vec<u32> },
}

impl From<RawConstraint> for Constraint {
    fn from(raw: RawConstraint) -> Self {
        match raw {
            RawConstraint::Ranges { ranges } => Constraint::ranges(ranges),
            RawConstraint::Categories { values } => Constraint::categories(values),
        }
    }
}

impl Constraint {
    /// A single inclusive interval. Bounds are swapped if reversed.
    pub fn range(lo: u32, hi: u32) -> Self {
        Self::ranges([(lo, hi)])
    }

    /// An interval set, normalized to canonical form.
    pub fn ranges(ranges: impl IntoIterator<Item = (u32, u32)>) -> Self {
        let mut spans: Vec<(u32, u32)> = ranges
            .into_iter()
            .map(|(lo, hi)| if lo <= hi { (lo, hi) } else { (hi, lo) })
            .collect();
        spans.sort_unstable();

        let mut merged: Vec<(u32, u32)> = Vec::with_capacity(spans.len());
        for (lo, hi) in spans {
            match merged.last_mut() {
                Some(last) if lo <= last.1.saturating_add(1) => {
                    last.1 = last.1.max(hi);
                }
                _ => merged.push((lo, hi)),
            }
        }
        Self::Ranges { ranges: merged }
    }

    /// A category set.
    pub fn categories(values: impl IntoIterator<Item = u32>) -> Self {
        Self::Categories {
            values: values.into_iter().collect(),
        }
    }

    pub fn kind(&self) -> DimensionKind {
        match self {
            Self::Ranges { .. } => DimensionKind::Ordinal,
            Self::Categories { .. } => DimensionKind::Nominal,
        }
    }

    /// Every admitted value code, ascending.
    pub fn values(&self) -> Vec<u32> {
        match self {
            Self::Ranges { ranges } => ranges.iter().flat_map(|&(lo, hi)| lo..=hi).collect(),
            Self::Categories { values } => values.iter().copied().collect(),
        }
    }

    /// Number of admitted value codes.
    pub fn len(&self) -> usize {
        match self {
            Self::Ranges { ranges } => ranges
                .iter()
                .map(|&(lo, hi)| (hi - lo) as usize + 1)
                .sum(),
            Self::Categories { values } => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains_value(&self, value: u32) -> bool {
        match self {
            Self::Ranges { ranges } => ranges.iter().any(|&(lo, hi)| lo <= value && value <= hi),
            Self::Categories { values } => values.contains(&value),
        }
    }

    /// Union of two constraints of the same kind; `None` across kinds.
    pub fn union(&self, other: &Self) -> Option<Self> {
        match (self, other) {
            (Self::Ranges { ranges: a }, Self::Ranges { ranges: b }) => {
                Some(Self::ranges(a.iter().chain(b.iter()).copied()))
            }
            (Self::Categories { values: a }, Self::Categories { values: b }) => {
                Some(Self::Categories {
                    values: a.union(b).copied().collect(),
                })
            }
            _ => None,
        }
    }

    /// Render with caller-supplied labels for each value code.
    pub fn render(&self, label: impl Fn(u32) -> String) -> String {
        match self {
            Self::Ranges { ranges } => {
                let spans: Vec<String> = ranges
                    .iter()
                    .map(|&(lo, hi)| {
                        if lo == hi {
                            label(lo)
                        } else {
                            format!("{}..{}", label(lo), label(hi))
                        }
                    })
                    .collect();
                format!("[{}]", spans.join(", "))
            }
            Self::Categories { values } => {
                let items: Vec<String> = values.iter().map(|&v| label(v)).collect();
                format!("{{{}}}", items.join(", "))
            }
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render(|v| v.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_normalize_touching_and_overlapping_spans() {
        let c = Constraint::ranges([(5, 6), (1, 2), (3, 3), (9, 8)]);
        assert_eq!(
            c,
            Constraint::Ranges {
                ranges: vec![(1, 3), (5, 6), (8, 9)]
            }
        );
        assert_eq!(c.len(), 7);

        let touching = Constraint::ranges([(5, 6), (1, 2), (3, 4), (2, 3)]);
        assert_eq!(touching, Constraint::range(1, 6));
        assert_eq!(touching.len(), 6);
    }

    #[test]
    fn construction_order_does_not_affect_identity() {
        let a = Constraint::range(2, 2)
            .union(&Constraint::range(3, 3))
            .and_then(|c| c.union(&Constraint::range(1, 1)));
        let b = Constraint::range(1, 1)
            .union(&Constraint::range(2, 2))
            .and_then(|c| c.union(&Constraint::range(3, 3)));
        assert_eq!(a, b);
        assert_eq!(a, Some(Constraint::range(1, 3)));
    }

    #[test]
    fn union_is_kind_checked() {
        let r = Constraint::range(0, 1);
        let c = Constraint::categories([0]);
        assert!(r.union(&c).is_none());
        assert_eq!(
            Constraint::categories([1, 4]).union(&Constraint::categories([2])),
            Some(Constraint::categories([1, 2, 4]))
        );
    }

    #[test]
    fn deserialization_canonicalizes() {
        let raw = r#"{"kind":"ranges","ranges":[[4,4],[2,3]]}"#;
        let c: Constraint = serde_json::from_str(raw).unwrap();
        assert_eq!(c, Constraint::range(2, 4));

        let raw = r#"{"kind":"categories","values":[3,1,3]}"#;
        let c: Constraint = serde_json::from_str(raw).unwrap();
        assert_eq!(c, Constraint::categories([1, 3]));
    }

    #[test]
    fn render_uses_labels() {
        let c = Constraint::ranges([(0, 1), (3, 3)]);
        assert_eq!(c.render(|v| format!("v{v}")), "[v0..v1, v3]");
        assert_eq!(Constraint::categories([2, 0]).to_string(), "{0, 2}");
    }
}
