//! Errors raised while building a table or its scorers.

use crate::jsonl::JsonlError;

#[derive(Debug, thiserror::Error)]
pub enum TabularError {
    #[error(transparent)]
    Jsonl(#[from] JsonlError),

    #[error("csv line {0}: {1}")]
    Csv(usize, String),

    #[error("unknown column: {0}")]
    UnknownColumn(String),

    #[error("column {column}: row {row} is not numeric")]
    NotNumeric { column: String, row: usize },

    #[error("invalid table options: {0}")]
    InvalidOptions(String),

    #[error("table options parse error: {0}")]
    OptionsParse(#[from] toml::de::Error),

    #[error("{0} requires a target column")]
    MissingTarget(&'static str),
}
