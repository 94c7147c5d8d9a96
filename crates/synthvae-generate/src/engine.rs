use std::path::PathBuf;
use std::time::Instant;

use synthvae_core::{Column, RoleTable, Table, Value, write_table_csv};
use tracing::{info, warn};

use crate::errors::GenerationError;
use crate::generator::SyntheticGenerator;
use crate::model::{ColumnReport, GenerateOptions, GenerationReport};

/// Result of a generation run.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub out_dir: PathBuf,
    pub synthetic_path: PathBuf,
    pub table: Table,
    pub report: GenerationReport,
}

/// Runs a generator and persists its output.
#[derive(Debug, Clone)]
pub struct GenerationEngine {
    options: GenerateOptions,
}

impl GenerationEngine {
    pub fn new(options: GenerateOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    pub fn run(
        &self,
        generator: &dyn SyntheticGenerator,
        real: &Table,
        roles: &RoleTable,
    ) -> Result<GenerationResult, GenerationError> {
        let start = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        std::fs::create_dir_all(&self.options.out_dir)?;

        if self.options.rows == 0 {
            return Err(GenerationError::InvalidInput(
                "rows must be greater than zero".to_string(),
            ));
        }
        if roles.contains(&self.options.id_column) {
            return Err(GenerationError::InvalidInput(format!(
                "id column '{}' collides with a configured feature",
                self.options.id_column
            )));
        }

        info!(
            run_id = %run_id,
            generator = generator.name(),
            rows = self.options.rows,
            seed = self.options.seed,
            "generation started"
        );

        let generated = generator.generate(real, self.options.rows, roles)?;
        if generated.row_count() != self.options.rows {
            warn!(
                run_id = %run_id,
                requested = self.options.rows,
                generated = generated.row_count(),
                "generator returned a different row count"
            );
        }

        let columns = column_reports(real, &generated, roles);
        let table = with_id_column(&self.options.id_column, generated)?;

        let synthetic_path = self.options.out_dir.join("synthetic.csv");
        let bytes_written = write_table_csv(&synthetic_path, &table)?;

        let report = GenerationReport {
            run_id: run_id.clone(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            generator: generator.name().to_string(),
            seed: self.options.seed,
            rows_requested: self.options.rows as u64,
            rows_generated: table.row_count() as u64,
            columns,
            bytes_written,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        let report_path = self.options.out_dir.join("generation_report.json");
        std::fs::write(&report_path, serde_json::to_vec_pretty(&report)?)?;

        info!(
            run_id = %run_id,
            rows_generated = report.rows_generated,
            bytes_written = report.bytes_written,
            duration_ms = report.duration_ms,
            "generation completed"
        );

        Ok(GenerationResult {
            out_dir: self.options.out_dir.clone(),
            synthetic_path,
            table,
            report,
        })
    }
}

fn with_id_column(id_column: &str, generated: Table) -> Result<Table, GenerationError> {
    let ids = (0..generated.row_count())
        .map(|idx| Value::Int(idx as i64))
        .collect();
    let mut columns = vec![Column::new(id_column, ids)];
    columns.extend(generated.columns().iter().cloned());
    Ok(Table::new(columns)?)
}

fn column_reports(real: &Table, synthetic: &Table, roles: &RoleTable) -> Vec<ColumnReport> {
    roles
        .iter()
        .map(|(name, role)| ColumnReport {
            name: name.to_string(),
            role,
            real_missing_rate: missing_rate(real.column(name)),
            synthetic_missing_rate: missing_rate(synthetic.column(name)),
        })
        .collect()
}

fn missing_rate(column: Option<&Column>) -> f64 {
    match column {
        Some(column) if !column.is_empty() => column.missing_count() as f64 / column.len() as f64,
        _ => 0.0,
    }
}
