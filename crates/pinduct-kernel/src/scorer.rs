//! The quality function.

use crate::coverage::Coverage;
use crate::error::ScoreError;

/// Maps a coverage set to a scalar quality.
///
/// Must be pure and deterministic: the kernel caches the first score it
/// sees for each predicate and compares scores across sweeps. A failure is
/// fatal to the search; it is never retried.
pub trait Scorer: Send + Sync {
    fn score(&self, coverage: &Coverage) -> Result<f64, ScoreError>;
}

impl<F> Scorer for F
where
    F: Fn(&Coverage) -> Result<f64, ScoreError> + Send + Sync,
{
    fn score(&self, coverage: &Coverage) -> Result<f64, ScoreError> {
        self(coverage)
    }
}

/// Score `coverage`, turning NaN into a scorer failure.
pub(crate) fn checked_score(scorer: &dyn Scorer, coverage: &Coverage) -> Result<f64, ScoreError> {
    let score = scorer.score(coverage)?;
    if score.is_nan() {
        return Err(ScoreError::NotANumber {
            support: coverage.count(),
        });
    }
    // -0.0 and 0.0 must not compare as distinct under the total order.
    Ok(if score == 0.0 { 0.0 } else { score })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_scorers() {
        let support = |c: &Coverage| -> Result<f64, ScoreError> { Ok(c.count() as f64) };
        let coverage = Coverage::from_indices(4, [0, 3]);
        assert_eq!(checked_score(&support, &coverage), Ok(2.0));
    }

    #[test]
    fn nan_is_a_failure() {
        let broken = |_: &Coverage| -> Result<f64, ScoreError> { Ok(f64::NAN) };
        let coverage = Coverage::full(3);
        assert_eq!(
            checked_score(&broken, &coverage),
            Err(ScoreError::NotANumber { support: 3 })
        );
    }
}
