//! Coverage sets: which records a predicate selects.
//!
//! A roaring bitmap of record indices, tagged with the size of the dataset
//! it was drawn from. Coverages from different datasets are never subsets
//! of one another.

use roaring::RoaringBitmap;

/// Set of record indices.
#[derive(Debug, Clone, PartialEq)]
pub struct Coverage {
    universe: usize,
    records: RoaringBitmap,
}

impl Coverage {
    /// No records selected, over a dataset of `universe` records.
    pub fn empty(universe: usize) -> Self {
        Self {
            universe,
            records: RoaringBitmap::new(),
        }
    }

    /// Every record selected.
    pub fn full(universe: usize) -> Self {
        let mut records = RoaringBitmap::new();
        records.insert_range(0..record_id(universe));
        Self { universe, records }
    }

    /// Build from a per-record predicate.
    pub fn from_fn(universe: usize, mut selected: impl FnMut(usize) -> bool) -> Self {
        Self::from_indices(universe, (0..universe).filter(|&index| selected(index)))
    }

    /// Build from explicit indices. Indices beyond `universe` are ignored.
    pub fn from_indices(universe: usize, indices: impl IntoIterator<Item = usize>) -> Self {
        let records = indices
            .into_iter()
            .filter(|&index| index < universe)
            .map(record_id)
            .collect();
        Self { universe, records }
    }

    /// Number of selected records.
    pub fn count(&self) -> usize {
        self.records.len() as usize
    }

    /// Whether every record selected here is also selected by `other`.
    pub fn is_subset(&self, other: &Self) -> bool {
        self.universe == other.universe && self.records.is_subset(&other.records)
    }

    /// In-place intersection.
    pub fn intersect_with(&mut self, other: &Self) {
        self.records &= &other.records;
    }

    /// Selected record indices, ascending.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.records.iter().map(|id| id as usize)
    }
}

/// Record indices are stored as `u32`; larger datasets saturate.
fn record_id(index: usize) -> u32 {
    u32::try_from(index).unwrap_or(u32::MAX)
}
