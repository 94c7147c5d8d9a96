use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use synthvae_config::EvaluationConfig;
use synthvae_core::ColumnRole;

/// Options for the generation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Directory where `synthetic.csv` and the report are written.
    pub out_dir: PathBuf,
    /// Number of rows to request from the generator.
    pub rows: usize,
    /// Seed recorded in the report.
    pub seed: u64,
    /// Identifier column prepended to the output.
    pub id_column: String,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("out"),
            rows: 1000,
            seed: 0,
            id_column: "ROW_ID".to_string(),
        }
    }
}

impl GenerateOptions {
    pub fn from_config(out_dir: PathBuf, config: &EvaluationConfig) -> Self {
        Self {
            out_dir,
            rows: config.generation.synthetic_rows as usize,
            seed: config.generation.seed,
            id_column: config.generation.id_column.clone(),
        }
    }
}

/// Per-column summary of a generation run.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnReport {
    pub name: String,
    pub role: ColumnRole,
    pub real_missing_rate: f64,
    pub synthetic_missing_rate: f64,
}

/// Report for a generation run.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub run_id: String,
    pub generated_at: String,
    pub generator: String,
    pub seed: u64,
    pub rows_requested: u64,
    pub rows_generated: u64,
    pub columns: Vec<ColumnReport>,
    pub bytes_written: u64,
    pub duration_ms: u64,
}
