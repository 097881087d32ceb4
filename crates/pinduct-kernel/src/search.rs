//! The bottom-up lattice search.
//!
//! A [`SearchSession`] owns the frontier, accepted, and rejected sets of one
//! search. Each sweep takes the whole frontier, generates and scores merge
//! candidates for every frontier predicate (on the rayon pool when
//! `parallel` is set), then commits the decisions one frontier predicate at
//! a time in frontier order. Only the commit phase mutates session state,
//! so parallel and sequential sweeps make identical decisions.
//!
//! ```text
//! frontier ──sweep──▶ improving candidates ──▶ next frontier / rejected
//!     │
//!     └── no improvement ──▶ admission ──▶ accepted / rejected
//! ```

use crate::backend::{Backend, Dimension};
use crate::conditional::conditional_merge;
use crate::config::SearchConfig;
use crate::error::InductionError;
use crate::outcome::{FinalPredicate, RejectReason, Rejection, SearchOutcome, Termination};
use crate::predicate::{Fingerprint, MergeMode, Predicate};
use crate::scored::{Scored, Sequence};
use crate::scorer::Scorer;
use crate::select::select_final;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Instant;

/// Run a complete search from the backend's base predicates.
pub fn induce(
    backend: &dyn Backend,
    scorer: &dyn Scorer,
    config: SearchConfig,
) -> Result<SearchOutcome, InductionError> {
    SearchSession::new(backend, scorer, config)?.run()
}

/// State of one search.
pub struct SearchSession<'a> {
    backend: &'a dyn Backend,
    scorer: &'a dyn Scorer,
    config: SearchConfig,
    dimensions: Vec<Dimension>,
    /// Refine partners, per dimension, in backend order.
    bases: Vec<(Dimension, Vec<Arc<Predicate>>)>,
    frontier: Vec<Scored>,
    /// Kept sorted by [`Scored::rank`].
    accepted: Vec<Scored>,
    rejected: Vec<Rejection>,
    /// Every predicate that ever entered the frontier or the rejected set.
    seen: HashSet<Arc<Predicate>>,
    sequence: Sequence,
    sweeps: usize,
    started: Instant,
}

/// Candidates of one frontier predicate that beat its score, in generation
/// order.
struct Evaluation {
    improving: Vec<(Arc<Predicate>, f64)>,
}

impl<'a> SearchSession<'a> {
    /// Validate `config` and seed the frontier with every base predicate.
    pub fn new(
        backend: &'a dyn Backend,
        scorer: &'a dyn Scorer,
        config: SearchConfig,
    ) -> Result<Self, InductionError> {
        let seeds = Predicate::base_predicates(backend);
        Self::with_frontier(backend, scorer, config, seeds)
    }

    /// Validate `config` and seed the frontier with `seeds`.
    ///
    /// Duplicate seeds collapse onto the first occurrence. Refine partners
    /// are still the backend's base predicates.
    pub fn with_frontier(
        backend: &'a dyn Backend,
        scorer: &'a dyn Scorer,
        config: SearchConfig,
        seeds: Vec<Predicate>,
    ) -> Result<Self, InductionError> {
        config.validate()?;

        let dimensions = backend.dimensions();
        let bases: Vec<(Dimension, Vec<Arc<Predicate>>)> = dimensions
            .iter()
            .filter_map(|dimension| {
                let kind = backend.kind(dimension)?;
                let predicates = backend
                    .base_values(dimension)
                    .into_iter()
                    .map(|value| Arc::new(Predicate::base(dimension.clone(), kind, value)))
                    .collect();
                Some((dimension.clone(), predicates))
            })
            .collect();

        let mut seen = HashSet::new();
        let mut unique = Vec::new();
        for seed in seeds {
            let seed = Arc::new(seed);
            if seen.insert(seed.clone()) {
                unique.push(seed);
            }
        }

        let scores = if config.parallel {
            unique
                .par_iter()
                .map(|p| p.score(backend, scorer))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            unique
                .iter()
                .map(|p| p.score(backend, scorer))
                .collect::<Result<Vec<_>, _>>()?
        };

        let mut sequence = Sequence::default();
        let mut frontier: Vec<Scored> = unique
            .into_iter()
            .zip(scores)
            .map(|(predicate, score)| Scored::new(sequence.next(), predicate, score))
            .collect();
        frontier.sort_by(Scored::rank);

        tracing::debug!(
            seeds = frontier.len(),
            dimensions = dimensions.len(),
            records = backend.record_count(),
            "search seeded"
        );

        Ok(Self {
            backend,
            scorer,
            config,
            dimensions,
            bases,
            frontier,
            accepted: Vec::new(),
            rejected: Vec::new(),
            seen,
            sequence,
            sweeps: 0,
            started: Instant::now(),
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// The current frontier, in the order the next sweep visits it.
    pub fn frontier(&self) -> &[Scored] {
        &self.frontier
    }

    /// The accepted set, descending score, then sequence.
    pub fn accepted(&self) -> &[Scored] {
        &self.accepted
    }

    /// The rejection ledger so far.
    pub fn rejected(&self) -> &[Rejection] {
        &self.rejected
    }

    pub fn sweeps(&self) -> usize {
        self.sweeps
    }

    /// Why the loop would stop now, if it would.
    fn stop_reason(&self) -> Option<Termination> {
        if self.frontier.is_empty() {
            return Some(Termination::Exhausted);
        }
        if self.sweeps >= self.config.max_iters {
            return Some(Termination::IterationCap);
        }
        if let Some(deadline) = self.config.deadline()
            && self.started.elapsed() >= deadline
        {
            return Some(Termination::Deadline);
        }
        None
    }

    /// Sweep until the frontier empties or a cap is reached, then rescue
    /// the residual frontier and select the final predicates.
    pub fn run(mut self) -> Result<SearchOutcome, InductionError> {
        let termination = loop {
            if let Some(reason) = self.stop_reason() {
                break reason;
            }
            self.sweep()?;
        };
        self.finish(termination)
    }

    /// One pass over the whole frontier.
    pub fn sweep(&mut self) -> Result<(), InductionError> {
        let frontier = std::mem::take(&mut self.frontier);
        self.sweeps += 1;

        let this = &*self;
        let evaluations = if this.config.parallel {
            frontier
                .par_iter()
                .map(|entry| this.evaluate(entry))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            frontier
                .iter()
                .map(|entry| this.evaluate(entry))
                .collect::<Result<Vec<_>, _>>()?
        };

        let rejected_before = self.rejected.len();
        let mut next = Vec::new();
        for (entry, evaluation) in frontier.into_iter().zip(evaluations) {
            if evaluation.improving.is_empty() {
                self.admit(entry)?;
                continue;
            }
            for (candidate, score) in evaluation.improving {
                if self.seen.contains(&candidate) {
                    continue;
                }
                self.seen.insert(candidate.clone());
                let dominator = self.dominator(&candidate, score)?;
                if let Some(by) = dominator {
                    self.reject(candidate, score, RejectReason::Dominated { by });
                } else {
                    next.push(Scored::new(self.sequence.next(), candidate, score));
                }
            }
        }
        next.sort_by(Scored::rank);
        self.frontier = next;

        tracing::debug!(
            sweep = self.sweeps,
            frontier = self.frontier.len(),
            accepted = self.accepted.len(),
            rejected = self.rejected.len() - rejected_before,
            "sweep complete"
        );
        Ok(())
    }

    /// Generate `entry`'s merge candidates and keep those that score
    /// strictly higher. Read-only on session state.
    fn evaluate(&self, entry: &Scored) -> Result<Evaluation, InductionError> {
        let mut improving = Vec::new();
        for candidate in self.candidates(&entry.predicate)? {
            let candidate = match self.seen.get(&*candidate) {
                Some(known) => known.clone(),
                None => candidate,
            };
            let score = candidate.score(self.backend, self.scorer)?;
            if score > entry.score {
                improving.push((candidate, score));
            }
        }
        Ok(Evaluation { improving })
    }

    /// Expand-merges along each constrained dimension, then refine-merges
    /// with the base predicates of each open dimension. Duplicates
    /// collapse onto their first occurrence.
    fn candidates(&self, predicate: &Predicate) -> Result<Vec<Arc<Predicate>>, InductionError> {
        let mut out = Vec::new();
        let mut generated = HashSet::new();
        let mut push = |candidate: Predicate| {
            let candidate = Arc::new(candidate);
            if generated.insert(candidate.clone()) {
                out.push(candidate);
            }
        };

        if self.config.expand {
            for dimension in &self.dimensions {
                let Some(constraint) = predicate.constraint(dimension) else {
                    continue;
                };
                let additions: BTreeSet<u32> = constraint
                    .values()
                    .into_iter()
                    .flat_map(|value| self.backend.adjacent(dimension, value))
                    .filter(|value| !constraint.contains_value(*value))
                    .collect();
                for value in additions {
                    if let Some(neighbor) = predicate.neighbor(dimension, value) {
                        push(predicate.merge(&neighbor, MergeMode::Expand)?);
                    }
                }
            }
        }

        if self.config.refine {
            for (dimension, bases) in &self.bases {
                if predicate.is_constrained(dimension) {
                    continue;
                }
                for base in bases {
                    push(predicate.merge(base, MergeMode::Refine)?);
                }
            }
        }

        Ok(out)
    }

    /// The first accepted predicate that contains `candidate` and scores
    /// strictly higher.
    fn dominator(
        &self,
        candidate: &Predicate,
        score: f64,
    ) -> Result<Option<Fingerprint>, InductionError> {
        for c in &self.accepted {
            if c.score > score && c.predicate.contains(candidate, self.backend)? {
                return Ok(Some(c.predicate.fingerprint()));
            }
        }
        Ok(None)
    }

    /// Decide a locally maximal frontier predicate.
    fn admit(&mut self, entry: Scored) -> Result<(), InductionError> {
        if entry.score <= self.config.threshold {
            self.reject(entry.predicate, entry.score, RejectReason::BelowThreshold);
            return Ok(());
        }
        if let Some(by) = self.dominator(&entry.predicate, entry.score)? {
            self.reject(entry.predicate, entry.score, RejectReason::Dominated { by });
            return Ok(());
        }

        let mut related = Vec::with_capacity(self.accepted.len());
        let mut better = None;
        for b in &self.accepted {
            let containee = entry.predicate.contains(&b.predicate, self.backend)?;
            if containee && b.score >= entry.score {
                better = Some(b.predicate.fingerprint());
                break;
            }
            related.push(containee || b.predicate.contains(&entry.predicate, self.backend)?);
        }
        if let Some(containee) = better {
            self.reject(
                entry.predicate,
                entry.score,
                RejectReason::SubsumesBetter { containee },
            );
            return Ok(());
        }

        // Everything related to `entry` scores no higher than it does.
        let by = entry.predicate.fingerprint();
        let accepted = std::mem::take(&mut self.accepted);
        for (b, evict) in accepted.into_iter().zip(related) {
            if evict {
                self.reject(b.predicate, b.score, RejectReason::Evicted { by: by.clone() });
            } else {
                self.accepted.push(b);
            }
        }

        tracing::trace!(predicate = %entry.predicate, score = entry.score, "accepted");
        let at = self
            .accepted
            .partition_point(|a| Scored::rank(a, &entry) == Ordering::Less);
        self.accepted.insert(at, entry);
        Ok(())
    }

    fn reject(&mut self, predicate: Arc<Predicate>, score: f64, reason: RejectReason) {
        tracing::trace!(predicate = %predicate, score, ?reason, "rejected");
        self.rejected.push(Rejection {
            fingerprint: predicate.fingerprint(),
            predicate: (*predicate).clone(),
            score,
            sweep: self.sweeps,
            reason,
        });
    }

    /// Conditionally merge whatever is left on the frontier and select the
    /// final predicates.
    pub fn finish(mut self, termination: Termination) -> Result<SearchOutcome, InductionError> {
        let residual = std::mem::take(&mut self.frontier);
        let residual_len = residual.len();
        let rescued = conditional_merge(
            residual,
            self.backend,
            self.scorer,
            self.config.conditional_threshold,
            &mut self.sequence,
        )?;

        let selected = select_final(&self.accepted, &rescued.accepted, self.backend)?;
        let mut predicates = Vec::with_capacity(selected.len());
        for s in selected {
            let support = s.entry.predicate.coverage(self.backend)?.count();
            predicates.push(FinalPredicate {
                predicate: (*s.entry.predicate).clone(),
                score: s.entry.score,
                support,
                provenance: s.provenance,
                fingerprint: s.entry.predicate.fingerprint(),
            });
        }

        tracing::info!(
            sweeps = self.sweeps,
            ?termination,
            accepted = self.accepted.len(),
            conditionally_accepted = rescued.accepted.len(),
            rejected = self.rejected.len(),
            predicates = predicates.len(),
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "search finished"
        );

        Ok(SearchOutcome {
            predicates,
            accepted: self.accepted.len(),
            conditionally_accepted: rescued.accepted.len(),
            residual: residual_len,
            discarded: rescued.discarded.len(),
            rejected: self.rejected,
            sweeps: self.sweeps,
            termination,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DimensionKind;
    use crate::coverage::Coverage;
    use crate::error::ScoreError;
    use crate::outcome::Provenance;
    use crate::predicate::tests::Grid;
    use std::sync::atomic::Ordering as AtomicOrdering;

    fn support(c: &Coverage) -> Result<f64, ScoreError> {
        Ok(c.count() as f64)
    }

    fn x(lo: u32, hi: u32) -> Predicate {
        let mut p = Predicate::base(Dimension::new("x"), DimensionKind::Ordinal, lo);
        for v in (lo + 1)..=hi {
            let q = Predicate::base(Dimension::new("x"), DimensionKind::Ordinal, v);
            p = p.merge(&q, MergeMode::Expand).unwrap();
        }
        p
    }

    /// Scores a 3-wide strip by which columns are covered.
    fn strip(wide: f64) -> impl Fn(&Coverage) -> Result<f64, ScoreError> {
        move |c: &Coverage| -> Result<f64, ScoreError> {
            let covered: Vec<usize> = c.iter().collect();
            Ok(match covered.as_slice() {
                [1] => 3.0,
                [0] | [2] => 1.0,
                [0, 1] | [1, 2] => 2.0,
                [0, 1, 2] => wide,
                _ => 0.0,
            })
        }
    }

    fn expand_only() -> SearchConfig {
        SearchConfig {
            refine: false,
            parallel: false,
            ..SearchConfig::default()
        }
    }

    #[test]
    fn seeds_are_sorted_base_predicates() {
        let grid = Grid::new(3, 2);
        let session = SearchSession::new(&grid, &support, SearchConfig::default()).unwrap();
        let scores: Vec<f64> = session.frontier().iter().map(|s| s.score).collect();
        assert_eq!(scores, vec![3.0, 3.0, 2.0, 2.0, 2.0]);
        assert_eq!(session.frontier()[0].seq, 3);
    }

    #[test]
    fn invalid_config_fails_before_scoring() {
        let grid = Grid::new(2, 2);
        let config = SearchConfig::default().with_thresholds(0.1, 0.2);
        assert!(matches!(
            SearchSession::new(&grid, &support, config),
            Err(InductionError::InvalidConfig(_))
        ));
        assert_eq!(grid.coverage_calls.load(AtomicOrdering::SeqCst), 0);
    }

    #[test]
    fn expanded_predicates_leave_without_a_verdict() {
        let grid = Grid::new(2, 1);
        let config = SearchConfig {
            parallel: false,
            ..SearchConfig::default()
        };
        let mut session = SearchSession::new(&grid, &support, config).unwrap();
        session.sweep().unwrap();
        assert_eq!(session.frontier().len(), 1);
        assert_eq!(*session.frontier()[0].predicate, x(0, 1));
        assert_eq!(session.accepted().len(), 1);
        assert!(session.rejected().is_empty());

        let outcome = session.run().unwrap();
        assert_eq!(outcome.termination, Termination::Exhausted);
        assert_eq!(outcome.sweeps, 2);
        assert_eq!(outcome.len(), 2);
        assert!(
            outcome
                .predicates
                .iter()
                .all(|p| p.provenance == Provenance::Accepted && p.score == 2.0)
        );
    }

    #[test]
    fn below_threshold_is_ledgered_per_sweep() {
        let grid = Grid::new(2, 1);
        let config = SearchConfig {
            threshold: 5.0,
            conditional_threshold: 5.0,
            parallel: false,
            ..SearchConfig::default()
        };
        let outcome = induce(&grid, &support, config).unwrap();
        assert!(outcome.is_empty());
        let ledger: Vec<(usize, &RejectReason)> = outcome
            .rejected
            .iter()
            .map(|r| (r.sweep, &r.reason))
            .collect();
        assert_eq!(
            ledger,
            vec![
                (1, &RejectReason::BelowThreshold),
                (2, &RejectReason::BelowThreshold)
            ]
        );
    }

    #[test]
    fn wider_admission_evicts_weaker_containee() {
        let grid = Grid::new(3, 1);
        let scorer = strip(5.0);
        let outcome = induce(&grid, &scorer, expand_only()).unwrap();

        let wide = x(0, 2);
        let evicted: Vec<&Rejection> = outcome
            .rejected
            .iter()
            .filter(|r| matches!(r.reason, RejectReason::Evicted { .. }))
            .collect();
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].predicate, x(1, 1));
        assert_eq!(
            evicted[0].reason,
            RejectReason::Evicted {
                by: wide.fingerprint()
            }
        );
        assert_eq!(evicted[0].sweep, 3);
        assert!(outcome.predicates.iter().any(|p| p.predicate == wide));
    }

    #[test]
    fn containee_at_least_as_good_blocks_admission() {
        let grid = Grid::new(3, 1);
        let scorer = strip(3.0);
        let outcome = induce(&grid, &scorer, expand_only()).unwrap();

        let wide = x(0, 2);
        let verdict = outcome
            .rejected
            .iter()
            .find(|r| r.predicate == wide)
            .unwrap();
        assert_eq!(
            verdict.reason,
            RejectReason::SubsumesBetter {
                containee: x(1, 1).fingerprint()
            }
        );
        assert!(outcome.predicates.iter().any(|p| p.predicate == x(1, 1)));
    }

    #[test]
    fn candidates_inside_better_accepted_are_dominated() {
        let grid = Grid::new(4, 1);
        let scorer = |c: &Coverage| -> Result<f64, ScoreError> {
            Ok(match c.count() {
                1 => 1.0,
                2 => 2.0,
                3 => 9.0,
                _ => 0.0,
            })
        };
        let seeds = vec![x(0, 2), x(0, 0)];
        let session = SearchSession::with_frontier(&grid, &scorer, expand_only(), seeds).unwrap();
        let outcome = session.run().unwrap();
        let dominated = outcome
            .rejected
            .iter()
            .find(|r| r.predicate == x(0, 1))
            .unwrap();
        assert_eq!(
            dominated.reason,
            RejectReason::Dominated {
                by: x(0, 2).fingerprint()
            }
        );
        assert_eq!(dominated.sweep, 1);
    }

    #[test]
    fn admission_inside_better_container_is_dominated() {
        let grid = Grid::new(3, 1);
        let scorer = strip(9.0);
        let seeds = vec![x(0, 2), x(1, 1)];
        let session = SearchSession::with_frontier(&grid, &scorer, expand_only(), seeds).unwrap();
        let outcome = session.run().unwrap();
        assert_eq!(outcome.len(), 1);
        assert_eq!(outcome.predicates[0].predicate, x(0, 2));
        assert_eq!(
            outcome.rejected[0].reason,
            RejectReason::Dominated {
                by: x(0, 2).fingerprint()
            }
        );
    }

    #[test]
    fn iteration_cap_rescues_the_residual() {
        let grid = Grid::new(2, 1);
        let config = SearchConfig {
            parallel: false,
            ..SearchConfig::default()
        }
        .with_max_iters(1);
        let outcome = induce(&grid, &support, config).unwrap();
        assert_eq!(outcome.termination, Termination::IterationCap);
        assert!(!outcome.is_complete());
        assert_eq!(outcome.residual, 1);
        assert_eq!(outcome.conditionally_accepted, 1);
        let provenances: Vec<Provenance> = outcome.predicates.iter().map(|p| p.provenance).collect();
        assert_eq!(
            provenances,
            vec![Provenance::Accepted, Provenance::ConditionallyAccepted]
        );
    }

    #[test]
    fn elapsed_deadline_stops_before_the_first_sweep() {
        let grid = Grid::new(2, 1);
        let config = SearchConfig {
            deadline_ms: Some(0),
            ..SearchConfig::default()
        };
        let outcome = induce(&grid, &support, config).unwrap();
        assert_eq!(outcome.termination, Termination::Deadline);
        assert_eq!(outcome.sweeps, 0);
        assert_eq!(outcome.residual, 3);
        assert_eq!(outcome.len(), 2);
        assert!(
            outcome
                .predicates
                .iter()
                .all(|p| p.provenance == Provenance::ConditionallyAccepted)
        );
    }

    #[test]
    fn empty_backend_is_an_empty_result() {
        let grid = Grid::new(0, 0);
        let outcome = induce(&grid, &support, SearchConfig::default()).unwrap();
        assert!(outcome.is_empty());
        assert_eq!(outcome.sweeps, 0);
        assert!(outcome.is_complete());
    }

    #[test]
    fn scorer_failures_abort() {
        let grid = Grid::new(2, 2);
        let failing = |_: &Coverage| -> Result<f64, ScoreError> {
            Err(ScoreError::Failed("offline".to_string()))
        };
        let err = induce(&grid, &failing, SearchConfig::default()).unwrap_err();
        assert!(matches!(err, InductionError::Score(ScoreError::Failed(_))));

        let nan = |_: &Coverage| -> Result<f64, ScoreError> { Ok(f64::NAN) };
        let err = induce(&grid, &nan, SearchConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            InductionError::Score(ScoreError::NotANumber { .. })
        ));
    }
}
