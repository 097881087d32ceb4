//! Conjunctive region predicates.
//!
//! A predicate maps a set of dimensions to one [`Constraint`] each. Its
//! identity is that mapping and nothing else: two predicates built along
//! different merge paths that constrain the same dimensions to the same
//! values are equal and hash equally, so duplicate candidates collapse in
//! every queue the search keeps.
//!
//! Coverage and score are computed on first use and cached. The caches are
//! write-once; a predicate's coverage and score never change afterwards.

use crate::backend::{Backend, Dimension, DimensionKind};
use crate::constraint::Constraint;
use crate::coverage::Coverage;
use crate::error::{InductionError, MergeError};
use crate::scorer::{Scorer, checked_score};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

/// How two predicates combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeMode {
    /// Same dimension signature; constraints are unioned dimension by
    /// dimension. Coarsens the region without adding dimensions.
    Expand,

    /// The right operand only constrains dimensions the left leaves open;
    /// the result constrains the union of both signatures.
    Refine,
}

/// Content hash of a predicate's canonical form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(pub String);

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A conjunction of per-dimension constraints.
#[derive(Clone)]
pub struct Predicate {
    constraints: BTreeMap<Dimension, Constraint>,
    coverage: OnceLock<Coverage>,
    score: OnceLock<f64>,
}

impl Predicate {
    pub(crate) fn from_constraints(constraints: BTreeMap<Dimension, Constraint>) -> Self {
        Self {
            constraints,
            coverage: OnceLock::new(),
            score: OnceLock::new(),
        }
    }

    /// A single-dimension, single-value base predicate.
    pub fn base(dimension: Dimension, kind: DimensionKind, value: u32) -> Self {
        let mut constraints = BTreeMap::new();
        constraints.insert(dimension, kind.unit(value));
        Self::from_constraints(constraints)
    }

    /// Every base predicate the backend offers, dimension by dimension.
    pub fn base_predicates(backend: &dyn Backend) -> Vec<Predicate> {
        let mut predicates = Vec::new();
        for dimension in backend.dimensions() {
            let Some(kind) = backend.kind(&dimension) else {
                continue;
            };
            for value in backend.base_values(&dimension) {
                predicates.push(Self::base(dimension.clone(), kind, value));
            }
        }
        predicates
    }

    /// The constrained dimensions, in canonical order.
    pub fn dimensions(&self) -> impl Iterator<Item = &Dimension> + '_ {
        self.constraints.keys()
    }

    /// Whether both predicates constrain exactly the same dimensions.
    pub fn same_signature(&self, other: &Self) -> bool {
        self.constraints.keys().eq(other.constraints.keys())
    }

    pub fn signature(&self) -> Vec<Dimension> {
        self.constraints.keys().cloned().collect()
    }

    pub fn constraint(&self, dimension: &Dimension) -> Option<&Constraint> {
        self.constraints.get(dimension)
    }

    pub fn constraints(&self) -> &BTreeMap<Dimension, Constraint> {
        &self.constraints
    }

    pub fn is_constrained(&self, dimension: &Dimension) -> bool {
        self.constraints.contains_key(dimension)
    }

    /// Records satisfying every constraint. Computed once.
    pub fn coverage(&self, backend: &dyn Backend) -> Result<&Coverage, InductionError> {
        if let Some(coverage) = self.coverage.get() {
            return Ok(coverage);
        }
        let computed = backend.coverage(&self.constraints)?;
        Ok(self.coverage.get_or_init(move || computed))
    }

    /// Quality of this predicate's coverage. Computed once.
    ///
    /// The cache is not keyed by scorer: a predicate belongs to the search
    /// that first scored it.
    pub fn score(&self, backend: &dyn Backend, scorer: &dyn Scorer) -> Result<f64, InductionError> {
        if let Some(&score) = self.score.get() {
            return Ok(score);
        }
        let computed = checked_score(scorer, self.coverage(backend)?)?;
        Ok(*self.score.get_or_init(move || computed))
    }

    /// The cached score, if this predicate has been scored.
    pub fn cached_score(&self) -> Option<f64> {
        self.score.get().copied()
    }

    /// Same-signature containment: `other` constrains exactly the
    /// dimensions `self` does and covers a subset of `self`'s records.
    ///
    /// A predicate over `{x}` never contains one over `{x, y}`, even when
    /// its coverage is a superset.
    pub fn contains(&self, other: &Self, backend: &dyn Backend) -> Result<bool, InductionError> {
        if !self.same_signature(other) {
            return Ok(false);
        }
        Ok(other.coverage(backend)?.is_subset(self.coverage(backend)?))
    }

    /// Combine two predicates. See [`MergeMode`].
    pub fn merge(&self, other: &Self, mode: MergeMode) -> Result<Self, MergeError> {
        match mode {
            MergeMode::Expand => {
                if !self.same_signature(other) {
                    return Err(MergeError::SignatureMismatch {
                        left: self.signature(),
                        right: other.signature(),
                    });
                }
                let mut constraints = BTreeMap::new();
                for (dimension, left) in &self.constraints {
                    let right = &other.constraints[dimension];
                    let unioned = left
                        .union(right)
                        .ok_or_else(|| MergeError::KindMismatch(dimension.clone()))?;
                    constraints.insert(dimension.clone(), unioned);
                }
                Ok(Self::from_constraints(constraints))
            }
            MergeMode::Refine => {
                let mut constraints = self.constraints.clone();
                for (dimension, constraint) in &other.constraints {
                    if constraints.contains_key(dimension) {
                        return Err(MergeError::AlreadyConstrained(dimension.clone()));
                    }
                    constraints.insert(dimension.clone(), constraint.clone());
                }
                Ok(Self::from_constraints(constraints))
            }
        }
    }

    /// Same signature, with `dimension` narrowed to the single `value`.
    ///
    /// The expand partner of `self` along `dimension`.
    pub(crate) fn neighbor(&self, dimension: &Dimension, value: u32) -> Option<Self> {
        let kind = self.constraints.get(dimension)?.kind();
        let mut constraints = self.constraints.clone();
        constraints.insert(dimension.clone(), kind.unit(value));
        Some(Self::from_constraints(constraints))
    }

    /// SHA-256 over the canonical `dimension=constraint` lines.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut hasher = Sha256::new();
        for (dimension, constraint) in &self.constraints {
            hasher.update(dimension.as_str().as_bytes());
            hasher.update(b"=");
            hasher.update(constraint.to_string().as_bytes());
            hasher.update(b"\n");
        }
        Fingerprint(format!("{:x}", hasher.finalize()))
    }

    /// Render with the backend's value labels.
    pub fn describe(&self, backend: &dyn Backend) -> String {
        let parts: Vec<String> = self
            .constraints
            .iter()
            .map(|(dimension, constraint)| {
                format!(
                    "{dimension}: {}",
                    constraint.render(|v| backend.label(dimension, v))
                )
            })
            .collect();
        format!("{{{}}}", parts.join(", "))
    }
}

/// Total order on scores. Used for every comparison and tie-break.
pub fn cmp_score(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}

impl PartialEq for Predicate {
    fn eq(&self, other: &Self) -> bool {
        self.constraints == other.constraints
    }
}

impl Eq for Predicate {}

impl Hash for Predicate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.constraints.hash(state);
    }
}

impl PartialOrd for Predicate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Predicate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.constraints.cmp(&other.constraints)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("constraints", &self.constraints)
            .field("score", &self.score.get())
            .finish()
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .constraints
            .iter()
            .map(|(dimension, constraint)| format!("{dimension}: {constraint}"))
            .collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

impl Serialize for Predicate {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.constraints.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Predicate {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        BTreeMap::<Dimension, Constraint>::deserialize(deserializer).map(Self::from_constraints)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ScoreError;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    /// Grid backend: record `i` sits at `x = i % width`, `y = i / width`.
    pub(crate) struct Grid {
        pub width: u32,
        pub height: u32,
        pub coverage_calls: AtomicUsize,
    }

    impl Grid {
        pub(crate) fn new(width: u32, height: u32) -> Self {
            Self {
                width,
                height,
                coverage_calls: AtomicUsize::new(0),
            }
        }

        fn axis(&self, index: usize, dimension: &Dimension) -> Option<u32> {
            let index = index as u32;
            match dimension.as_str() {
                "x" => Some(index % self.width),
                "y" => Some(index / self.width),
                _ => None,
            }
        }
    }

    impl Backend for Grid {
        fn dimensions(&self) -> Vec<Dimension> {
            vec![Dimension::new("x"), Dimension::new("y")]
        }

        fn kind(&self, dimension: &Dimension) -> Option<DimensionKind> {
            matches!(dimension.as_str(), "x" | "y").then_some(DimensionKind::Ordinal)
        }

        fn base_values(&self, dimension: &Dimension) -> Vec<u32> {
            match dimension.as_str() {
                "x" => (0..self.width).collect(),
                "y" => (0..self.height).collect(),
                _ => Vec::new(),
            }
        }

        fn adjacent(&self, dimension: &Dimension, value: u32) -> Vec<u32> {
            let limit = match dimension.as_str() {
                "x" => self.width,
                "y" => self.height,
                _ => return Vec::new(),
            };
            let mut out = Vec::new();
            if value > 0 {
                out.push(value - 1);
            }
            if value + 1 < limit {
                out.push(value + 1);
            }
            out
        }

        fn coverage(
            &self,
            constraints: &BTreeMap<Dimension, Constraint>,
        ) -> Result<Coverage, InductionError> {
            self.coverage_calls.fetch_add(1, AtomicOrdering::SeqCst);
            for dimension in constraints.keys() {
                if self.kind(dimension).is_none() {
                    return Err(InductionError::UnknownDimension(dimension.clone()));
                }
            }
            Ok(Coverage::from_fn(self.record_count(), |i| {
                constraints.iter().all(|(dimension, constraint)| {
                    self.axis(i, dimension)
                        .is_some_and(|v| constraint.contains_value(v))
                })
            }))
        }

        fn record_count(&self) -> usize {
            (self.width * self.height) as usize
        }
    }

    fn x(v: u32) -> Predicate {
        Predicate::base(Dimension::new("x"), DimensionKind::Ordinal, v)
    }

    fn y(v: u32) -> Predicate {
        Predicate::base(Dimension::new("y"), DimensionKind::Ordinal, v)
    }

    #[test]
    fn identity_ignores_construction_path() {
        let a = x(1).merge(&x(2), MergeMode::Expand).unwrap();
        let b = x(2).merge(&x(1), MergeMode::Expand).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn expand_is_commutative_in_coverage() {
        let grid = Grid::new(3, 3);
        let p = x(0).merge(&y(1), MergeMode::Refine).unwrap();
        let q = x(1).merge(&y(2), MergeMode::Refine).unwrap();
        let pq = p.merge(&q, MergeMode::Expand).unwrap();
        let qp = q.merge(&p, MergeMode::Expand).unwrap();
        assert_eq!(pq, qp);
        assert_eq!(pq.coverage(&grid).unwrap(), qp.coverage(&grid).unwrap());
    }

    #[test]
    fn refine_adds_a_dimension() {
        let cell = x(1).merge(&y(2), MergeMode::Refine).unwrap();
        assert_eq!(
            cell.signature(),
            vec![Dimension::new("x"), Dimension::new("y")]
        );
        let grid = Grid::new(3, 3);
        assert_eq!(cell.coverage(&grid).unwrap().iter().collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn merge_misuse_is_reported() {
        let cell = x(1).merge(&y(2), MergeMode::Refine).unwrap();
        assert_eq!(
            cell.merge(&x(0), MergeMode::Refine),
            Err(MergeError::AlreadyConstrained(Dimension::new("x")))
        );
        assert!(matches!(
            cell.merge(&x(0), MergeMode::Expand),
            Err(MergeError::SignatureMismatch { .. })
        ));
    }

    #[test]
    fn containment_requires_identical_signature() {
        let grid = Grid::new(3, 3);
        let column = x(1);
        let cell = x(1).merge(&y(1), MergeMode::Refine).unwrap();
        assert!(cell.coverage(&grid).unwrap().is_subset(column.coverage(&grid).unwrap()));
        assert!(!column.contains(&cell, &grid).unwrap());

        let wide = x(1).merge(&x(2), MergeMode::Expand).unwrap();
        assert!(wide.contains(&column, &grid).unwrap());
        assert!(!column.contains(&wide, &grid).unwrap());
        assert!(column.contains(&column, &grid).unwrap());
    }

    #[test]
    fn coverage_and_score_are_cached() {
        let grid = Grid::new(4, 4);
        let calls = AtomicUsize::new(0);
        let scorer = |c: &Coverage| -> Result<f64, ScoreError> {
            calls.fetch_add(1, AtomicOrdering::SeqCst);
            Ok(c.count() as f64)
        };
        let p = x(2);
        assert_eq!(p.cached_score(), None);
        assert_eq!(p.score(&grid, &scorer).unwrap(), 4.0);
        assert_eq!(p.score(&grid, &scorer).unwrap(), 4.0);
        assert_eq!(calls.load(AtomicOrdering::SeqCst), 1);
        assert_eq!(grid.coverage_calls.load(AtomicOrdering::SeqCst), 1);
        assert_eq!(p.cached_score(), Some(4.0));
    }

    #[test]
    fn unknown_dimension_is_a_backend_error() {
        let grid = Grid::new(2, 2);
        let p = Predicate::base(Dimension::new("z"), DimensionKind::Ordinal, 0);
        assert!(matches!(
            p.coverage(&grid),
            Err(InductionError::UnknownDimension(_))
        ));
    }

    #[test]
    fn describe_and_serialize() {
        let grid = Grid::new(3, 3);
        let p = x(1)
            .merge(&x(2), MergeMode::Expand)
            .unwrap()
            .merge(&y(0), MergeMode::Refine)
            .unwrap();
        assert_eq!(p.describe(&grid), "{x: [1..2], y: [0]}");
        let json = serde_json::to_value(&p).unwrap();
        let back: Predicate = serde_json::from_value(json).unwrap();
        assert_eq!(back, p);
    }
}
