use nalgebra::{DMatrix, SymmetricEigen};
use synthvae_core::Table;

use crate::align::TablePair;
use crate::errors::EvalError;
use crate::figure::{FigureCanvas, REAL_COLOR, SYNTHETIC_COLOR, Series, scatter_panel};
use crate::metrics::{PairComparator, dense_cells};
use crate::model::{MetricResult, NamedResult};
use crate::stats;

pub const PCA_FIGURE: &str = "pca_evaluation_figure";

const FIGURE_SIZE: (u32, u32) = (600, 600);

/// Two-component PCA of each table, fitted independently and overlaid.
///
/// The projections are for visual inspection only: each table gets its own
/// axes, so coordinates are not comparable across tables.
#[derive(Debug, Clone, Copy)]
pub struct ProjectionComparison {
    pub standardize: bool,
}

impl Default for ProjectionComparison {
    fn default() -> Self {
        Self { standardize: true }
    }
}

impl ProjectionComparison {
    pub fn new(standardize: bool) -> Self {
        Self { standardize }
    }

    /// Row coordinates on the first two principal components of `table`.
    pub fn project(&self, table: &Table) -> Result<Vec<(f64, f64)>, EvalError> {
        let rows = table.row_count();
        let width = table.column_count();
        if rows < 2 || width < 2 {
            return Err(EvalError::metric(
                self.name(),
                format!("needs at least two rows and two columns, got {rows}x{width}"),
            ));
        }

        let mut columns = Vec::with_capacity(width);
        for column in table.columns() {
            let values = dense_cells(self.name(), column)?;
            let mean = stats::mean(&values).unwrap_or(0.0);
            let scale = match stats::std_dev(&values, 0) {
                Some(std) if self.standardize && std > 0.0 => std,
                _ => 1.0,
            };
            columns.push(
                values
                    .into_iter()
                    .map(|value| (value - mean) / scale)
                    .collect::<Vec<_>>(),
            );
        }

        let centred = DMatrix::from_fn(rows, width, |row, col| columns[col][row]);
        let covariance = centred.tr_mul(&centred) / (rows - 1) as f64;
        let eigen = SymmetricEigen::new(covariance);

        let mut order: Vec<usize> = (0..width).collect();
        order.sort_by(|a, b| eigen.eigenvalues[*b].total_cmp(&eigen.eigenvalues[*a]));

        let components: Vec<Vec<f64>> = order[..2]
            .iter()
            .map(|idx| oriented(eigen.eigenvectors.column(*idx).iter().copied().collect()))
            .collect();

        Ok((0..rows)
            .map(|row| {
                let score = |component: &[f64]| {
                    component
                        .iter()
                        .enumerate()
                        .map(|(col, weight)| centred[(row, col)] * weight)
                        .sum::<f64>()
                };
                (score(&components[0]), score(&components[1]))
            })
            .collect())
    }
}

/// Flip the sign so the largest-magnitude loading is positive.
fn oriented(mut component: Vec<f64>) -> Vec<f64> {
    let pivot = component
        .iter()
        .copied()
        .fold(0.0_f64, |best, value| if value.abs() > best.abs() { value } else { best });
    if pivot < 0.0 {
        component.iter_mut().for_each(|value| *value = -*value);
    }
    component
}

impl PairComparator for ProjectionComparison {
    fn name(&self) -> &'static str {
        "pca_evaluation"
    }

    fn compare(&self, pair: &TablePair) -> Result<Vec<NamedResult>, EvalError> {
        let real = self.project(&pair.real)?;
        let synthetic = self.project(&pair.synthetic)?;

        let mut canvas = FigureCanvas::new(FIGURE_SIZE.0, FIGURE_SIZE.1);
        canvas.draw(|root| {
            scatter_panel(
                root,
                &[
                    Series::new(synthetic, SYNTHETIC_COLOR),
                    Series::new(real, REAL_COLOR),
                ],
            )
        })?;
        Ok(vec![NamedResult::new(
            PCA_FIGURE,
            MetricResult::Image(canvas.finish()?),
        )])
    }
}
