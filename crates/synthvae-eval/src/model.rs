use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use synthvae_core::Table;

use crate::errors::EvalError;

/// Bundle contract version for `bundle.json`.
pub const BUNDLE_VERSION: &str = "0.1";

/// Reason recorded for comparators switched off in the configuration.
pub const DISABLED_REASON: &str = "disabled by configuration";

/// Options for an evaluation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateOptions {
    /// Directory for `bundle.json` and reports; nothing is written when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<PathBuf>,
    pub write_markdown: bool,
    pub write_html: bool,
    /// Row cap for tables rendered into reports.
    pub max_table_rows: usize,
}

impl Default for EvaluateOptions {
    fn default() -> Self {
        Self {
            out_dir: None,
            write_markdown: true,
            write_html: true,
            max_table_rows: 20,
        }
    }
}

/// PNG image, base64 encoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageArtifact {
    pub width: u32,
    pub height: u32,
    pub png_base64: String,
}

/// One computed metric value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MetricResult {
    Scalar(f64),
    Table(Table),
    Image(ImageArtifact),
}

impl MetricResult {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            MetricResult::Scalar(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            MetricResult::Table(table) => Some(table),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageArtifact> {
        match self {
            MetricResult::Image(image) => Some(image),
            _ => None,
        }
    }
}

/// A metric result under its flattened bundle name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedResult {
    pub name: String,
    pub result: MetricResult,
}

impl NamedResult {
    pub fn new(name: impl Into<String>, result: MetricResult) -> Self {
        Self {
            name: name.into(),
            result,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Completed { results: Vec<NamedResult> },
    Skipped { reason: String },
}

/// Outcome of one unit of comparator work.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparatorEntry {
    /// Unique entry name: the comparator name, or `{column}_{kind}` for
    /// per-column comparators.
    pub name: String,
    pub comparator: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub duration_ms: u64,
    pub outcome: Outcome,
}

impl ComparatorEntry {
    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, Outcome::Skipped { .. })
    }

    pub fn skip_reason(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Skipped { reason } => Some(reason),
            Outcome::Completed { .. } => None,
        }
    }

    pub fn results(&self) -> &[NamedResult] {
        match &self.outcome {
            Outcome::Completed { results } => results,
            Outcome::Skipped { .. } => &[],
        }
    }
}

/// Everything one evaluation run produced, in execution order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationBundle {
    pub bundle_version: String,
    pub run_id: String,
    pub real_rows: u64,
    pub synthetic_rows: u64,
    pub entries: Vec<ComparatorEntry>,
}

impl EvaluationBundle {
    pub fn new(run_id: impl Into<String>, real_rows: usize, synthetic_rows: usize) -> Self {
        Self {
            bundle_version: BUNDLE_VERSION.to_string(),
            run_id: run_id.into(),
            real_rows: real_rows as u64,
            synthetic_rows: synthetic_rows as u64,
            entries: Vec::new(),
        }
    }

    /// Append an entry, rejecting entry or metric names already present.
    pub fn push(&mut self, entry: ComparatorEntry) -> Result<(), EvalError> {
        if self.entry(&entry.name).is_some() {
            return Err(EvalError::DuplicateMetric(entry.name));
        }
        let mut names: HashSet<&str> = self.metric_names().into_iter().collect();
        for result in entry.results() {
            if !names.insert(result.name.as_str()) {
                return Err(EvalError::DuplicateMetric(result.name.clone()));
            }
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn entry(&self, name: &str) -> Option<&ComparatorEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// Flattened lookup by metric name.
    pub fn get(&self, metric: &str) -> Option<&MetricResult> {
        self.entries
            .iter()
            .flat_map(|entry| entry.results())
            .find(|named| named.name == metric)
            .map(|named| &named.result)
    }

    pub fn scalar(&self, metric: &str) -> Option<f64> {
        self.get(metric).and_then(MetricResult::as_scalar)
    }

    pub fn table(&self, metric: &str) -> Option<&Table> {
        self.get(metric).and_then(MetricResult::as_table)
    }

    pub fn image(&self, metric: &str) -> Option<&ImageArtifact> {
        self.get(metric).and_then(MetricResult::as_image)
    }

    pub fn metric_names(&self) -> Vec<&str> {
        self.entries
            .iter()
            .flat_map(|entry| entry.results())
            .map(|named| named.name.as_str())
            .collect()
    }

    pub fn skipped(&self) -> impl Iterator<Item = &ComparatorEntry> {
        self.entries.iter().filter(|entry| entry.is_skipped())
    }
}

/// Performance timings for the evaluation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub load_ms: u128,
    pub align_ms: u128,
    pub metrics_ms: u128,
    pub total_ms: u128,
}

/// Result of an evaluation run.
#[derive(Debug, Clone)]
pub struct EvaluationResult {
    pub bundle: EvaluationBundle,
    pub performance: PerformanceMetrics,
    pub report_markdown: String,
    pub bundle_path: Option<PathBuf>,
    pub markdown_path: Option<PathBuf>,
    pub html_path: Option<PathBuf>,
}
