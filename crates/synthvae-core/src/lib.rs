//! Core contracts and helpers for synthvae.
//!
//! This crate defines the in-memory table model, column roles, CSV IO and the
//! stage-graph ordering shared by the generation and evaluation crates.

pub mod error;
pub mod graph;
pub mod io;
pub mod role;
pub mod table;

pub use error::{Error, Result, TableSide};
pub use graph::{GraphError, StageGraph, StageSpec};
pub use io::{
    parse_cell, read_table_csv, read_table_from_reader, write_table_csv, write_table_to_writer,
};
pub use role::{ColumnRole, RoleTable};
pub use table::{Column, Table, Value};

/// Indicator column stacked onto combined real/synthetic tables: 0 = real,
/// 1 = synthetic. A feature may not share this name.
pub const SOURCE_COLUMN: &str = "synthetic_data";

/// Current contract version for run artifacts.
pub const ARTIFACT_VERSION: &str = "0.1";
