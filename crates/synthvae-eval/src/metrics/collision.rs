use std::collections::HashMap;

use synthvae_core::{Column, Table};

use crate::align::TablePair;
use crate::errors::EvalError;
use crate::metrics::PairComparator;
use crate::model::{MetricResult, NamedResult};

pub const NUMBER_OF_ROWS: &str = "number_of_rows";
pub const SAME_ROW: &str = "same_row";

/// Exact row matches between the tables, ignoring the first (identifier)
/// column.
#[derive(Debug, Clone, Copy, Default)]
pub struct RowCollisionCheck;

impl RowCollisionCheck {
    /// Inner join on every column but the first. Each matching
    /// `(real, synthetic)` pair yields one row: the real row followed by the
    /// synthetic identifier.
    pub fn matches(&self, pair: &TablePair) -> Result<Table, EvalError> {
        let names = pair.real.column_names();
        if names.len() < 2 {
            return Err(EvalError::metric(
                self.name(),
                "needs an identifier column plus at least one compared column",
            ));
        }
        if names != pair.synthetic.column_names() {
            return Err(EvalError::metric(
                self.name(),
                "real and synthetic tables have different columns",
            ));
        }

        let mut synthetic_index: HashMap<String, Vec<usize>> = HashMap::new();
        for row in 0..pair.synthetic.row_count() {
            synthetic_index
                .entry(row_key(&pair.synthetic, row))
                .or_default()
                .push(row);
        }

        let mut real_rows = Vec::new();
        let mut synthetic_ids = Vec::new();
        let id_values = &pair.synthetic.columns()[0].values;
        for row in 0..pair.real.row_count() {
            if let Some(hits) = synthetic_index.get(&row_key(&pair.real, row)) {
                for hit in hits {
                    real_rows.push(row);
                    synthetic_ids.push(id_values[*hit].clone());
                }
            }
        }

        let mut same_row = pair.real.take_rows(&real_rows);
        same_row.push_column(Column::new(format!("{}_synthetic", names[0]), synthetic_ids))?;
        Ok(same_row)
    }
}

fn row_key(table: &Table, row: usize) -> String {
    table.row(row)[1..]
        .iter()
        .map(|value| value.join_key())
        .collect::<Vec<_>>()
        .join("|")
}

impl PairComparator for RowCollisionCheck {
    fn name(&self) -> &'static str {
        "collision_analysis"
    }

    fn compare(&self, pair: &TablePair) -> Result<Vec<NamedResult>, EvalError> {
        let same_row = self.matches(pair)?;
        Ok(vec![
            NamedResult::new(
                NUMBER_OF_ROWS,
                MetricResult::Scalar(same_row.row_count() as f64),
            ),
            NamedResult::new(SAME_ROW, MetricResult::Table(same_row)),
        ])
    }
}
