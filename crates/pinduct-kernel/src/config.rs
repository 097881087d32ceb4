//! Search configuration.
//!
//! Parsed from TOML either as a top-level table or nested under `[search]`,
//! so the same file can also carry backend settings:
//!
//! ```toml
//! [search]
//! threshold = 0.5
//! conditional_threshold = 0.3
//! max_iters = 64
//! ```

use crate::error::InductionError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_MAX_ITERS: usize = 100;

/// Invocation parameters of one search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    /// Strict lower bound for unconditional acceptance.
    pub threshold: f64,

    /// Strict lower bound for predicates rescued from the residual
    /// frontier. Must not exceed `threshold`.
    #[serde(alias = "conditionalThreshold")]
    pub conditional_threshold: f64,

    /// Sweep cap. Reaching it is not an error.
    #[serde(alias = "maxIters")]
    pub max_iters: usize,

    /// Evaluate frontier predicates of one sweep on the rayon pool.
    pub parallel: bool,

    /// Wall-clock budget, checked at sweep boundaries only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline_ms: Option<u64>,

    /// Generate expand-merges (coarsen along constrained dimensions).
    pub expand: bool,

    /// Generate refine-merges (add an unconstrained dimension).
    pub refine: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            conditional_threshold: 0.0,
            max_iters: DEFAULT_MAX_ITERS,
            parallel: true,
            deadline_ms: None,
            expand: true,
            refine: true,
        }
    }
}

/// Sections other binaries keep next to `[search]` in the same file.
const SIBLING_SECTIONS: &[&str] = &["table"];

#[derive(Deserialize)]
struct Sectioned {
    #[serde(default)]
    search: SearchConfig,
}

impl SearchConfig {
    /// Builder-style threshold setters.
    pub fn with_thresholds(mut self, threshold: f64, conditional_threshold: f64) -> Self {
        self.threshold = threshold;
        self.conditional_threshold = conditional_threshold;
        self
    }

    pub fn with_max_iters(mut self, max_iters: usize) -> Self {
        self.max_iters = max_iters;
        self
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_ms.map(Duration::from_millis)
    }

    /// Reject configurations the search cannot run with.
    pub fn validate(&self) -> Result<(), InductionError> {
        if !self.threshold.is_finite() {
            return Err(InductionError::InvalidConfig(format!(
                "threshold must be finite, got {}",
                self.threshold
            )));
        }
        if !self.conditional_threshold.is_finite() {
            return Err(InductionError::InvalidConfig(format!(
                "conditional_threshold must be finite, got {}",
                self.conditional_threshold
            )));
        }
        if self.conditional_threshold > self.threshold {
            return Err(InductionError::InvalidConfig(format!(
                "conditional_threshold ({}) exceeds threshold ({})",
                self.conditional_threshold, self.threshold
            )));
        }
        if self.max_iters == 0 {
            return Err(InductionError::InvalidConfig(
                "max_iters must be positive".to_string(),
            ));
        }
        if !self.expand && !self.refine {
            return Err(InductionError::InvalidConfig(
                "at least one of expand/refine must be enabled".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse from TOML text: either a `[search]` table (alongside sibling
    /// sections such as `[table]`) or bare top-level keys.
    ///
    /// Does not validate; callers run [`validate`](Self::validate) after
    /// applying any overrides.
    pub fn from_toml_str(text: &str) -> Result<Self, InductionError> {
        let value: toml::Value = text.parse()?;
        let has_section = value.as_table().is_some_and(|t| {
            t.get("search").is_some_and(toml::Value::is_table)
                || SIBLING_SECTIONS.iter().any(|name| t.contains_key(*name))
        });
        if has_section {
            let sectioned: Sectioned = value.try_into()?;
            Ok(sectioned.search)
        } else {
            Ok(value.try_into()?)
        }
    }

    /// Parse from a TOML file.
    pub fn from_toml_path(path: impl AsRef<Path>) -> Result<Self, InductionError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| InductionError::InvalidConfig(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}
