use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Which table of a real/synthetic pair an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableSide {
    Real,
    Synthetic,
    Combined,
}

impl fmt::Display for TableSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableSide::Real => f.write_str("real"),
            TableSide::Synthetic => f.write_str("synthetic"),
            TableSide::Combined => f.write_str("combined"),
        }
    }
}

/// Core error type shared across synthvae crates.
#[derive(Debug, Error)]
pub enum Error {
    /// A requested column is absent from one of the tables.
    #[error("schema error: column '{column}' not found in {side} table")]
    MissingColumn { column: String, side: TableSide },
    /// Tables do not share the expected shape or column layout.
    #[error("schema error: {0}")]
    Schema(String),
    /// A per-column transform failed on malformed data.
    #[error("transform error in column '{column}' at row {row}: {reason}")]
    Transform {
        column: String,
        row: usize,
        reason: String,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// Convenience alias for results returned by synthvae crates.
pub type Result<T> = std::result::Result<T, Error>;
