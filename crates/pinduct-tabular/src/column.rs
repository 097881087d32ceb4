//! Column typing and value encoding.
//!
//! Every dimension column is encoded as dense `u32` codes:
//! - numeric: equal-width bins over `[min, max]`, only occupied bins kept,
//!   ranked ascending; adjacent = consecutive ranks
//! - ordinal: distinct values sorted ascending, code = rank; adjacent =
//!   consecutive ranks
//! - nominal: distinct values in first-appearance order; adjacent only
//!   along configured edges
//!
//! Missing cells (absent or `null`) get no code and are never covered.

use crate::error::TabularError;
use pinduct_kernel::{Constraint, Coverage, Dimension, DimensionKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// How a column's raw values are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Continuous; binned into an ordinal dimension.
    Numeric,
    /// Ordered discrete values.
    Ordinal,
    /// Unordered categories.
    Nominal,
}

impl ColumnType {
    /// JSON floats make a column numeric, integers ordinal, anything else
    /// nominal. Nulls are ignored; an all-null column has no type.
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a Value>) -> Option<Self> {
        let mut float = false;
        let mut int = false;
        for value in values {
            match value {
                Value::Null => {}
                Value::Number(n) if n.is_f64() => float = true,
                Value::Number(_) => int = true,
                _ => return Some(Self::Nominal),
            }
        }
        if float {
            Some(Self::Numeric)
        } else if int {
            Some(Self::Ordinal)
        } else {
            None
        }
    }

    /// Dimension kind after encoding.
    pub fn kind(self) -> DimensionKind {
        match self {
            Self::Numeric | Self::Ordinal => DimensionKind::Ordinal,
            Self::Nominal => DimensionKind::Nominal,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric => write!(f, "numeric"),
            Self::Ordinal => write!(f, "ordinal"),
            Self::Nominal => write!(f, "nominal"),
        }
    }
}

/// One encoded dimension column.
#[derive(Debug, Clone)]
pub struct Column {
    name: Dimension,
    column_type: ColumnType,
    codes: Vec<Option<u32>>,
    labels: Vec<String>,
    /// Configured neighbours of each nominal code.
    edges: Vec<BTreeSet<u32>>,
}

impl Column {
    /// Encode one cell per row. `bins` only applies to numeric columns.
    pub fn encode(
        name: Dimension,
        column_type: ColumnType,
        cells: &[Option<&Value>],
        bins: usize,
    ) -> Result<Self, TabularError> {
        let (codes, labels) = match column_type {
            ColumnType::Numeric => encode_numeric(&name, cells, bins)?,
            ColumnType::Ordinal => encode_ordinal(cells),
            ColumnType::Nominal => encode_nominal(cells),
        };
        let edges = vec![BTreeSet::new(); labels.len()];
        Ok(Self {
            name,
            column_type,
            codes,
            labels,
            edges,
        })
    }

    pub fn name(&self) -> &Dimension {
        &self.name
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn kind(&self) -> DimensionKind {
        self.column_type.kind()
    }

    /// Code of row `row`, or `None` when the cell is missing.
    pub fn code(&self, row: usize) -> Option<u32> {
        self.codes.get(row).copied().flatten()
    }

    /// Number of distinct codes.
    pub fn domain_len(&self) -> usize {
        self.labels.len()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn label(&self, code: u32) -> Option<&str> {
        self.labels.get(code as usize).map(String::as_str)
    }

    /// Rows with no code.
    pub fn missing(&self) -> usize {
        self.codes.iter().filter(|c| c.is_none()).count()
    }

    pub fn adjacent(&self, code: u32) -> Vec<u32> {
        match self.kind() {
            DimensionKind::Ordinal => {
                let mut out = Vec::with_capacity(2);
                if code > 0 {
                    out.push(code - 1);
                }
                if (code as usize) + 1 < self.labels.len() {
                    out.push(code + 1);
                }
                out
            }
            DimensionKind::Nominal => self
                .edges
                .get(code as usize)
                .map(|set| set.iter().copied().collect())
                .unwrap_or_default(),
        }
    }

    /// Add an undirected adjacency edge between two category labels.
    pub fn connect(&mut self, a: &str, b: &str) -> Result<(), TabularError> {
        if self.kind() != DimensionKind::Nominal {
            return Err(TabularError::InvalidOptions(format!(
                "column {}: adjacency applies to nominal columns only",
                self.name
            )));
        }
        let a = self.code_of(a)?;
        let b = self.code_of(b)?;
        if a != b {
            self.edges[a as usize].insert(b);
            self.edges[b as usize].insert(a);
        }
        Ok(())
    }

    fn code_of(&self, label: &str) -> Result<u32, TabularError> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|i| i as u32)
            .ok_or_else(|| {
                TabularError::InvalidOptions(format!(
                    "column {}: unknown category {label:?}",
                    self.name
                ))
            })
    }

    /// Rows whose code satisfies `constraint`.
    pub fn mask(&self, constraint: &Constraint) -> Coverage {
        Coverage::from_fn(self.codes.len(), |row| {
            self.code(row)
                .is_some_and(|code| constraint.contains_value(code))
        })
    }
}

type Encoded = (Vec<Option<u32>>, Vec<String>);

fn encode_numeric(
    name: &Dimension,
    cells: &[Option<&Value>],
    bins: usize,
) -> Result<Encoded, TabularError> {
    let mut numbers = Vec::with_capacity(cells.len());
    for (row, cell) in cells.iter().enumerate() {
        let number = match cell {
            None => None,
            Some(value) => Some(value.as_f64().ok_or_else(|| TabularError::NotNumeric {
                column: name.to_string(),
                row: row + 1,
            })?),
        };
        numbers.push(number);
    }

    let Some((min, max)) = numbers.iter().flatten().fold(None, |acc, &v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
    }) else {
        return Ok((numbers.iter().map(|_| None).collect(), Vec::new()));
    };

    let bins = bins.max(1);
    let width = (max - min) / bins as f64;
    let bin_of = |v: f64| {
        if width > 0.0 {
            (((v - min) / width).floor() as usize).min(bins - 1)
        } else {
            0
        }
    };

    let occupied: BTreeSet<usize> = numbers.iter().flatten().map(|&v| bin_of(v)).collect();
    let rank: BTreeMap<usize, u32> = occupied
        .iter()
        .enumerate()
        .map(|(rank, &bin)| (bin, rank as u32))
        .collect();
    let labels = occupied
        .iter()
        .map(|&bin| {
            let lo = min + width * bin as f64;
            if bin + 1 >= bins || width <= 0.0 {
                format!("[{}, {}]", fmt_number(lo), fmt_number(max))
            } else {
                let hi = min + width * (bin + 1) as f64;
                format!("[{}, {})", fmt_number(lo), fmt_number(hi))
            }
        })
        .collect();
    let codes = numbers
        .iter()
        .map(|v| v.and_then(|v| rank.get(&bin_of(v)).copied()))
        .collect();
    Ok((codes, labels))
}

/// Sort key for ordinal values: numbers before text.
#[derive(Debug, Clone)]
enum OrdKey {
    Number(f64),
    Text(String),
}

impl OrdKey {
    fn of(value: &Value) -> Self {
        match value {
            Value::String(s) => Self::Text(s.clone()),
            other => match other.as_f64() {
                Some(n) => Self::Number(n),
                None => Self::Text(other.to_string()),
            },
        }
    }

    fn order(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Number(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Number(_)) => Ordering::Greater,
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
        }
    }

    fn label(&self) -> String {
        match self {
            Self::Number(n) => fmt_number(*n),
            Self::Text(s) => s.clone(),
        }
    }
}

fn encode_ordinal(cells: &[Option<&Value>]) -> Encoded {
    let keys: Vec<Option<OrdKey>> = cells.iter().map(|c| c.map(OrdKey::of)).collect();
    let mut domain: Vec<OrdKey> = keys.iter().flatten().cloned().collect();
    domain.sort_by(OrdKey::order);
    domain.dedup_by(|a, b| a.order(b) == Ordering::Equal);

    let codes = keys
        .iter()
        .map(|key| {
            let key = key.as_ref()?;
            domain
                .binary_search_by(|entry| entry.order(key))
                .ok()
                .map(|i| i as u32)
        })
        .collect();
    let labels = domain.iter().map(OrdKey::label).collect();
    (codes, labels)
}

fn encode_nominal(cells: &[Option<&Value>]) -> Encoded {
    let mut index: HashMap<String, u32> = HashMap::new();
    let mut labels = Vec::new();
    let codes = cells
        .iter()
        .map(|cell| {
            let label = match (*cell)? {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let next = labels.len() as u32;
            let code = *index.entry(label.clone()).or_insert(next);
            if code == next {
                labels.push(label);
            }
            Some(code)
        })
        .collect();
    (codes, labels)
}

/// Integers without a fraction, everything else to three decimals with
/// trailing zeros trimmed.
fn fmt_number(x: f64) -> String {
    if x.fract() == 0.0 && x.abs() < 1e15 {
        return format!("{}", x as i64);
    }
    let fixed = format!("{x:.3}");
    fixed.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn encode(column_type: ColumnType, values: &[Value], bins: usize) -> Column {
        let cells: Vec<Option<&Value>> = values
            .iter()
            .map(|v| if v.is_null() { None } else { Some(v) })
            .collect();
        Column::encode(Dimension::new("c"), column_type, &cells, bins).unwrap()
    }

    #[test]
    fn inference_follows_json_number_kinds() {
        assert_eq!(
            ColumnType::infer(&[json!(1), json!(2.5)]),
            Some(ColumnType::Numeric)
        );
        assert_eq!(
            ColumnType::infer(&[json!(1), json!(null), json!(3)]),
            Some(ColumnType::Ordinal)
        );
        assert_eq!(
            ColumnType::infer(&[json!(1), json!("a")]),
            Some(ColumnType::Nominal)
        );
        assert_eq!(ColumnType::infer(&[json!(true)]), Some(ColumnType::Nominal));
        assert_eq!(ColumnType::infer(&[json!(null)]), None);
    }

    #[test]
    fn ordinal_codes_are_sorted_ranks() {
        let column = encode(
            ColumnType::Ordinal,
            &[json!(30), json!(10), json!(null), json!(20), json!(10)],
            1,
        );
        assert_eq!(column.labels(), ["10", "20", "30"]);
        let codes: Vec<Option<u32>> = (0..5).map(|r| column.code(r)).collect();
        assert_eq!(codes, vec![Some(2), Some(0), None, Some(1), Some(0)]);
        assert_eq!(column.adjacent(0), vec![1]);
        assert_eq!(column.adjacent(1), vec![0, 2]);
        assert_eq!(column.adjacent(2), vec![1]);
        assert_eq!(column.missing(), 1);
    }

    #[test]
    fn numeric_bins_keep_only_occupied_bins() {
        let column = encode(
            ColumnType::Numeric,
            &[json!(0.0), json!(0.5), json!(10.0)],
            4,
        );
        assert_eq!(column.labels(), ["[0, 2.5)", "[7.5, 10]"]);
        assert_eq!(column.code(1), Some(0));
        assert_eq!(column.code(2), Some(1));
        assert_eq!(column.adjacent(0), vec![1]);
    }

    #[test]
    fn numeric_max_lands_in_last_bin() {
        let values: Vec<Value> = (0..10).map(|i| json!(i as f64)).collect();
        let column = encode(ColumnType::Numeric, &values, 3);
        assert_eq!(column.labels(), ["[0, 3)", "[3, 6)", "[6, 9]"]);
        assert_eq!(column.code(9), Some(2));
        assert_eq!(column.code(3), Some(1));
    }

    #[test]
    fn constant_numeric_column_is_one_bin() {
        let column = encode(ColumnType::Numeric, &[json!(1.5), json!(1.5)], 5);
        assert_eq!(column.labels(), ["[1.5, 1.5]"]);
        assert_eq!(column.code(0), Some(0));
    }

    #[test]
    fn numeric_override_rejects_text() {
        let values = [json!(1.0), json!("n/a")];
        let cells: Vec<Option<&Value>> = values.iter().map(Some).collect();
        let err = Column::encode(Dimension::new("c"), ColumnType::Numeric, &cells, 3).unwrap_err();
        assert!(matches!(err, TabularError::NotNumeric { row: 2, .. }));
    }

    #[test]
    fn nominal_codes_follow_first_appearance() {
        let mut column = encode(
            ColumnType::Nominal,
            &[json!("red"), json!("blue"), json!("red"), json!(7)],
            1,
        );
        assert_eq!(column.labels(), ["red", "blue", "7"]);
        assert_eq!(column.code(2), Some(0));
        assert!(column.adjacent(0).is_empty());

        column.connect("red", "7").unwrap();
        assert_eq!(column.adjacent(0), vec![2]);
        assert_eq!(column.adjacent(2), vec![0]);
        assert!(column.connect("red", "green").is_err());
    }

    #[test]
    fn adjacency_is_nominal_only() {
        let mut column = encode(ColumnType::Ordinal, &[json!(1), json!(2)], 1);
        assert!(matches!(
            column.connect("1", "2"),
            Err(TabularError::InvalidOptions(_))
        ));
    }

    #[test]
    fn mask_never_covers_missing_cells() {
        let column = encode(ColumnType::Ordinal, &[json!(1), json!(null), json!(2)], 1);
        let mask = column.mask(&Constraint::range(0, 1));
        assert_eq!(mask.iter().collect::<Vec<_>>(), vec![0, 2]);
    }
}
