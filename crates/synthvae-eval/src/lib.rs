//! Real vs synthetic table evaluation for synthvae.
//!
//! [`align`] brings both tables onto one encoded schema, [`metrics`] holds the
//! comparators, and [`EvaluationEngine`] walks the stage graph in
//! [`pipeline`] to assemble an [`EvaluationBundle`] with markdown and HTML
//! reports.

pub mod align;
pub mod engine;
pub mod errors;
pub mod figure;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod stats;

pub use align::{
    SOURCE_COLUMN, TablePair, encode_categorical, encode_temporal, fill_missing, select_columns,
    split_by_source, tag_source,
};
pub use engine::EvaluationEngine;
pub use errors::EvalError;
pub use figure::FigureCanvas;
pub use metrics::{ColumnComparator, PairComparator};
pub use model::{
    ComparatorEntry, EvaluateOptions, EvaluationBundle, EvaluationResult, ImageArtifact,
    MetricResult, NamedResult, Outcome, PerformanceMetrics,
};
pub use report::{render_html, render_markdown};
