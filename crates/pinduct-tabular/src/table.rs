//! The in-memory table backend.

use crate::column::{Column, ColumnType};
use crate::delimited::read_csv_rows_from_path;
use crate::error::TabularError;
use crate::jsonl::{Row, read_rows_from_path};
use crate::options::TableOptions;
use pinduct_kernel::{
    Backend, Constraint, Coverage, Dimension, DimensionKind, InductionError, Predicate,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Parsed rows plus one encoded column per dimension.
#[derive(Debug, Clone)]
pub struct Table {
    rows: Vec<Row>,
    columns: Vec<Column>,
    index: BTreeMap<Dimension, usize>,
    target: Option<String>,
}

/// One dimension as `inspect` reports it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub column_type: ColumnType,
    pub kind: DimensionKind,
    /// Distinct codes (bins for numeric columns).
    pub values: usize,
    pub missing: usize,
    pub labels: Vec<String>,
}

impl Table {
    /// Type, bin and encode `rows`.
    ///
    /// Dimensions are `options.columns` in the given order when set,
    /// otherwise every column seen in any row, in name order. The target
    /// and excluded columns never become dimensions; all-null columns are
    /// skipped.
    pub fn from_rows(
        rows: Vec<Row>,
        target: Option<&str>,
        options: &TableOptions,
    ) -> Result<Self, TabularError> {
        options.validate()?;

        let known: BTreeSet<&str> = rows
            .iter()
            .flat_map(|row| row.keys().map(String::as_str))
            .collect();
        let require = |name: &str| {
            if known.contains(name) {
                Ok(())
            } else {
                Err(TabularError::UnknownColumn(name.to_string()))
            }
        };
        if let Some(target) = target {
            require(target)?;
        }
        for name in options.dtypes.keys().chain(options.adjacency.keys()) {
            require(name.as_str())?;
        }

        let candidates: Vec<String> = match &options.columns {
            Some(columns) => {
                for name in columns {
                    require(name.as_str())?;
                }
                columns.clone()
            }
            None => known.iter().map(|name| name.to_string()).collect(),
        };

        let bins = options.bins_for(rows.len());
        let mut columns = Vec::new();
        let mut index = BTreeMap::new();
        for name in candidates {
            if Some(name.as_str()) == target
                || options.exclude.contains(&name)
                || index.contains_key(&Dimension::new(name.clone()))
            {
                continue;
            }
            let cells: Vec<Option<&Value>> = rows
                .iter()
                .map(|row| row.get(&name).filter(|v| !v.is_null()))
                .collect();
            let column_type = match options.dtypes.get(&name) {
                Some(column_type) => *column_type,
                None => match ColumnType::infer(cells.iter().flatten().copied()) {
                    Some(column_type) => column_type,
                    None => {
                        tracing::debug!(column = %name, "skipping column without values");
                        continue;
                    }
                },
            };
            let dimension = Dimension::new(name.clone());
            let mut column = Column::encode(dimension.clone(), column_type, &cells, bins)?;
            if let Some(edges) = options.adjacency.get(&name) {
                for [a, b] in edges {
                    column.connect(a, b)?;
                }
            }
            index.insert(dimension, columns.len());
            columns.push(column);
        }

        tracing::debug!(
            rows = rows.len(),
            dimensions = columns.len(),
            target_column = target.unwrap_or("-"),
            "table built"
        );
        Ok(Self {
            rows,
            columns,
            index,
            target: target.map(str::to_string),
        })
    }

    /// Read a data file and build the table. Files ending in `.csv` are
    /// read as CSV, anything else as JSONL.
    pub fn load(
        path: impl AsRef<Path>,
        target: Option<&str>,
        options: &TableOptions,
    ) -> Result<Self, TabularError> {
        let path = path.as_ref();
        let rows = if path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        {
            read_csv_rows_from_path(path)?
        } else {
            read_rows_from_path(path)?
        };
        Self::from_rows(rows, target, options)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, dimension: &Dimension) -> Option<&Column> {
        self.index.get(dimension).map(|&i| &self.columns[i])
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// The target cell of every row (`None` when missing), or `None` when
    /// the table has no target.
    pub fn target_cells(&self) -> Option<Vec<Option<&Value>>> {
        let target = self.target.as_ref()?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(target).filter(|v| !v.is_null()))
                .collect(),
        )
    }

    /// Rows covered by `predicate`, in table order.
    pub fn select(&self, predicate: &Predicate) -> Result<Vec<&Row>, InductionError> {
        let coverage = predicate.coverage(self)?;
        Ok(coverage.iter().map(|i| &self.rows[i]).collect())
    }

    pub fn summary(&self) -> Vec<ColumnSummary> {
        self.columns
            .iter()
            .map(|column| ColumnSummary {
                name: column.name().to_string(),
                column_type: column.column_type(),
                kind: column.kind(),
                values: column.domain_len(),
                missing: column.missing(),
                labels: column.labels().to_vec(),
            })
            .collect()
    }
}

impl Backend for Table {
    fn dimensions(&self) -> Vec<Dimension> {
        self.columns.iter().map(|c| c.name().clone()).collect()
    }

    fn kind(&self, dimension: &Dimension) -> Option<DimensionKind> {
        self.column(dimension).map(Column::kind)
    }

    fn base_values(&self, dimension: &Dimension) -> Vec<u32> {
        self.column(dimension)
            .map(|c| (0..c.domain_len() as u32).collect())
            .unwrap_or_default()
    }

    fn adjacent(&self, dimension: &Dimension, value: u32) -> Vec<u32> {
        self.column(dimension)
            .map(|c| c.adjacent(value))
            .unwrap_or_default()
    }

    fn coverage(
        &self,
        constraints: &BTreeMap<Dimension, Constraint>,
    ) -> Result<Coverage, InductionError> {
        let mut coverage = Coverage::full(self.rows.len());
        for (dimension, constraint) in constraints {
            let column = self
                .column(dimension)
                .ok_or_else(|| InductionError::UnknownDimension(dimension.clone()))?;
            coverage.intersect_with(&column.mask(constraint));
        }
        Ok(coverage)
    }

    fn record_count(&self) -> usize {
        self.rows.len()
    }

    fn label(&self, dimension: &Dimension, value: u32) -> String {
        self.column(dimension)
            .and_then(|c| c.label(value))
            .map_or_else(|| value.to_string(), str::to_string)
    }
}
