//! Reference scorers over a table's target column.

use crate::error::TabularError;
use crate::table::Table;
use pinduct_kernel::{Coverage, ScoreError, Scorer};
use serde_json::Value;

/// Interpret a command-line label: JSON when it parses (`1`, `true`,
/// `"x"`), the raw text otherwise.
pub fn parse_label(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Numbers compare numerically (`1` matches `1.0`); everything else by
/// JSON equality.
fn same_label(cell: &Value, label: &Value) -> bool {
    match (cell.as_f64(), label.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => cell == label,
    }
}

/// Smoothed fraction of covered rows whose target is the positive label:
/// `positives / (n + prior_weight)`.
///
/// Empty coverage scores 0. Rows with a missing target count as negatives.
#[derive(Debug, Clone)]
pub struct LabelDensity {
    positive: Vec<bool>,
    prior_weight: f64,
}

impl LabelDensity {
    pub const DEFAULT_PRIOR_WEIGHT: f64 = 1.0;

    pub fn new(table: &Table, positive: &Value) -> Result<Self, TabularError> {
        let cells = table
            .target_cells()
            .ok_or(TabularError::MissingTarget("label density"))?;
        let flags = cells
            .into_iter()
            .map(|cell| cell.is_some_and(|v| same_label(v, positive)))
            .collect();
        Ok(Self::from_labels(flags))
    }

    /// One flag per record.
    pub fn from_labels(positive: Vec<bool>) -> Self {
        Self {
            positive,
            prior_weight: Self::DEFAULT_PRIOR_WEIGHT,
        }
    }

    pub fn with_prior_weight(mut self, prior_weight: f64) -> Self {
        self.prior_weight = prior_weight;
        self
    }

    /// Positive records overall.
    pub fn positives(&self) -> usize {
        self.positive.iter().filter(|p| **p).count()
    }
}

impl Scorer for LabelDensity {
    fn score(&self, coverage: &Coverage) -> Result<f64, ScoreError> {
        let n = coverage.count();
        if n == 0 {
            return Ok(0.0);
        }
        let denominator = n as f64 + self.prior_weight;
        if denominator <= 0.0 {
            return Err(ScoreError::Failed(format!(
                "prior weight {} leaves no positive denominator for {n} records",
                self.prior_weight
            )));
        }
        let positives = coverage
            .iter()
            .filter(|&i| self.positive.get(i).copied().unwrap_or(false))
            .count();
        Ok(positives as f64 / denominator)
    }
}

/// Mean of a numeric target over covered rows. Rows with a missing target
/// are skipped; a region with no target values scores 0.
#[derive(Debug, Clone)]
pub struct TargetMean {
    values: Vec<Option<f64>>,
}

impl TargetMean {
    pub fn new(table: &Table) -> Result<Self, TabularError> {
        let target = table
            .target()
            .ok_or(TabularError::MissingTarget("target mean"))?;
        let cells = table
            .target_cells()
            .ok_or(TabularError::MissingTarget("target mean"))?;
        let mut values = Vec::with_capacity(cells.len());
        for (row, cell) in cells.into_iter().enumerate() {
            values.push(match cell {
                None => None,
                Some(value) => Some(value.as_f64().ok_or_else(|| TabularError::NotNumeric {
                    column: target.to_string(),
                    row: row + 1,
                })?),
            });
        }
        Ok(Self { values })
    }

    pub fn from_values(values: Vec<Option<f64>>) -> Self {
        Self { values }
    }
}

impl Scorer for TargetMean {
    fn score(&self, coverage: &Coverage) -> Result<f64, ScoreError> {
        let (sum, count) = coverage
            .iter()
            .filter_map(|i| self.values.get(i).copied().flatten())
            .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
        if count == 0 {
            return Ok(0.0);
        }
        Ok(sum / count as f64)
    }
}
