//! Conditional merge of the residual frontier.
//!
//! When the sweep loop stops with predicates still on the frontier, those
//! predicates never reached a local maximum. Rather than dropping them,
//! they are grouped by dimension signature and greedily merged: the best
//! predicate of a group absorbs every other member whose score the merge
//! beats, transitively, and the result is kept if it clears the lower
//! conditional threshold.

use crate::backend::{Backend, Dimension};
use crate::error::InductionError;
use crate::predicate::MergeMode;
use crate::scored::{Scored, Sequence};
use crate::scorer::Scorer;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

/// Output of [`conditional_merge`].
#[derive(Debug, Clone, Default)]
pub struct ConditionalMerge {
    /// Merged predicates above the conditional threshold, in the order
    /// they were produced.
    pub accepted: Vec<Scored>,

    /// Merged predicates at or below the conditional threshold.
    pub discarded: Vec<Scored>,
}

/// Greedily merge residual predicates within each dimension signature.
///
/// Groups are visited in signature order; within a group, seeds and
/// absorption candidates are visited by descending score, then sequence.
/// A seed keeps scanning the rest of its group until one full pass absorbs
/// nothing.
pub fn conditional_merge(
    residual: Vec<Scored>,
    backend: &dyn Backend,
    scorer: &dyn Scorer,
    conditional_threshold: f64,
    sequence: &mut Sequence,
) -> Result<ConditionalMerge, InductionError> {
    let mut groups: BTreeMap<Vec<Dimension>, Vec<Scored>> = BTreeMap::new();
    for entry in residual {
        groups
            .entry(entry.predicate.signature())
            .or_default()
            .push(entry);
    }

    let mut result = ConditionalMerge::default();
    for (signature, mut group) in groups {
        group.sort_by(Scored::rank);
        tracing::trace!(?signature, members = group.len(), "conditional merge group");

        let mut remaining: VecDeque<Scored> = group.into();
        while let Some(seed) = remaining.pop_front() {
            let current = absorb(seed, &mut remaining, backend, scorer, sequence)?;
            if current.score > conditional_threshold {
                tracing::trace!(
                    predicate = %current.predicate,
                    score = current.score,
                    "conditionally accepted"
                );
                result.accepted.push(current);
            } else {
                result.discarded.push(current);
            }
        }
    }
    Ok(result)
}

/// Absorb members of `remaining` into `seed` until a full pass changes
/// nothing. Members absorbed are removed from `remaining`.
fn absorb(
    seed: Scored,
    remaining: &mut VecDeque<Scored>,
    backend: &dyn Backend,
    scorer: &dyn Scorer,
    sequence: &mut Sequence,
) -> Result<Scored, InductionError> {
    let mut current = seed;
    loop {
        let mut absorbed = false;
        let mut index = 0;
        while index < remaining.len() {
            let candidate = &remaining[index];
            let merged = current
                .predicate
                .merge(&candidate.predicate, MergeMode::Expand)?;
            let merged_score = merged.score(backend, scorer)?;
            if merged_score > candidate.score {
                remaining.remove(index);
                if merged != *current.predicate {
                    current = Scored::new(sequence.next(), Arc::new(merged), merged_score);
                }
                absorbed = true;
            } else {
                index += 1;
            }
        }
        if !absorbed {
            return Ok(current);
        }
    }
}
