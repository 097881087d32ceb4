//! # pinduct-tabular
//!
//! In-memory tabular backend for the pinduct search.
//!
//! This crate provides:
//! - JSONL row ingest (one JSON object per line) and CSV ingest
//! - Column typing: inferred numeric / ordinal / nominal, overridable
//! - Equal-width binning of numeric columns into ordinal bins
//! - A [`Table`] implementing the kernel's `Backend`
//! - Reference scorers over a target column
//!
//! ## Data model
//!
//! ```text
//! JSONL / CSV
//!     │  read_rows / read_csv_rows
//! Vec<Row>
//!     │  Table::from_rows (typing, binning, encoding)
//! Table ── Backend ──▶ pinduct-kernel search
//!     └── scorers (LabelDensity, TargetMean)
//! ```

pub mod column;
pub mod delimited;
pub mod error;
pub mod jsonl;
pub mod options;
pub mod scorers;
pub mod table;

pub use column::{Column, ColumnType};
pub use delimited::{read_csv_rows, read_csv_rows_from_path};
pub use error::TabularError;
pub use jsonl::{JsonlError, Row, read_rows, read_rows_from_path};
pub use options::{DEFAULT_NUM_BINS, TableOptions};
pub use scorers::{LabelDensity, TargetMean, parse_label};
pub use table::{ColumnSummary, Table};
