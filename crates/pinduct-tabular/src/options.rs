//! Table construction options.
//!
//! Read from the `[table]` section of the same TOML file that carries
//! `[search]`:
//!
//! ```toml
//! [table]
//! num_bins = 10
//! exclude = ["id"]
//!
//! [table.dtypes]
//! age = "numeric"
//!
//! [table.adjacency]
//! color = [["red", "orange"], ["orange", "yellow"]]
//! ```

use crate::column::ColumnType;
use crate::error::TabularError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_NUM_BINS: usize = 15;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TableOptions {
    /// Equal-width bins per numeric column.
    pub num_bins: usize,

    /// When set, numeric columns get `rows / points_per_bin` bins instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points_per_bin: Option<usize>,

    /// Only these columns become dimensions, in this order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,

    /// Columns never used as dimensions.
    pub exclude: Vec<String>,

    /// Per-column type overrides.
    pub dtypes: BTreeMap<String, ColumnType>,

    /// Undirected adjacency edges between category labels of nominal
    /// columns. Nominal columns without an entry have no adjacency.
    pub adjacency: BTreeMap<String, Vec<[String; 2]>>,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            num_bins: DEFAULT_NUM_BINS,
            points_per_bin: None,
            columns: None,
            exclude: Vec::new(),
            dtypes: BTreeMap::new(),
            adjacency: BTreeMap::new(),
        }
    }
}

#[derive(Deserialize)]
struct Sectioned {
    #[serde(default)]
    table: TableOptions,
}

impl TableOptions {
    pub fn validate(&self) -> Result<(), TabularError> {
        if self.num_bins == 0 {
            return Err(TabularError::InvalidOptions(
                "num_bins must be positive".to_string(),
            ));
        }
        if self.points_per_bin == Some(0) {
            return Err(TabularError::InvalidOptions(
                "points_per_bin must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of bins for a numeric column over `rows` records.
    pub fn bins_for(&self, rows: usize) -> usize {
        match self.points_per_bin {
            Some(per_bin) if per_bin > 0 => (rows / per_bin).max(1),
            _ => self.num_bins.max(1),
        }
    }

    /// Parse the `[table]` section of a TOML document. Other sections are
    /// ignored; a document without `[table]` yields the defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, TabularError> {
        let sectioned: Sectioned = toml::from_str(text)?;
        Ok(sectioned.table)
    }

    pub fn from_toml_path(path: impl AsRef<Path>) -> Result<Self, TabularError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| TabularError::InvalidOptions(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}
