use synthvae_core::{Column, ColumnRole, Table, Value};

use crate::align::TablePair;
use crate::errors::EvalError;
use crate::metrics::ColumnComparator;
use crate::model::MetricResult;

pub const REAL_MISSING: &str = "real data % missing";
pub const SYNTHETIC_MISSING: &str = "synthetic data % missing";

/// Percentage of missing cells per side, as a one-row table.
#[derive(Debug, Clone, Copy, Default)]
pub struct MissingnessComparison;

impl ColumnComparator for MissingnessComparison {
    fn kind(&self) -> &'static str {
        "missingness"
    }

    fn suffix(&self) -> &'static str {
        "nulls"
    }

    fn compare(
        &self,
        pair: &TablePair,
        column: &str,
        _role: ColumnRole,
    ) -> Result<MetricResult, EvalError> {
        let (real, synthetic) = pair.columns(column)?;
        let table = Table::new(vec![
            Column::new(REAL_MISSING, vec![Value::Float(missing_percent(real))]),
            Column::new(SYNTHETIC_MISSING, vec![Value::Float(missing_percent(synthetic))]),
        ])?;
        Ok(MetricResult::Table(table))
    }
}

fn missing_percent(column: &Column) -> f64 {
    if column.is_empty() {
        return 0.0;
    }
    column.missing_count() as f64 / column.len() as f64 * 100.0
}
