//! Scored predicates with insertion sequence numbers.

use crate::predicate::{Predicate, cmp_score};
use std::cmp::Ordering;
use std::sync::Arc;

/// A predicate that has been scored and entered one of the search sets.
///
/// `seq` is assigned once, when the predicate first enters a set, and is
/// the stable tie-break between equal scores.
#[derive(Debug, Clone)]
pub struct Scored {
    pub seq: u64,
    pub predicate: Arc<Predicate>,
    pub score: f64,
}

impl Scored {
    pub fn new(seq: u64, predicate: Arc<Predicate>, score: f64) -> Self {
        Self {
            seq,
            predicate,
            score,
        }
    }

    /// Descending score, then ascending sequence number.
    ///
    /// Every scan that stops at the first match (dominance checks, seed
    /// selection, output order) walks its set in this order.
    pub fn rank(a: &Self, b: &Self) -> Ordering {
        cmp_score(b.score, a.score).then(a.seq.cmp(&b.seq))
    }
}

/// Monotonic sequence source shared by every set of one search.
#[derive(Debug, Default)]
pub struct Sequence(u64);

impl Sequence {
    pub fn next(&mut self) -> u64 {
        let seq = self.0;
        self.0 += 1;
        seq
    }
}
