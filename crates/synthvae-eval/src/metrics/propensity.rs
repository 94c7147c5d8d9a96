use nalgebra::{DMatrix, DVector};
use tracing::warn;

use crate::align::{SOURCE_COLUMN, TablePair, tag_source};
use crate::errors::EvalError;
use crate::figure::{FigureCanvas, REAL_COLOR, SYNTHETIC_COLOR, box_panel, histogram_panel};
use crate::metrics::{PairComparator, dense_cells};
use crate::model::{MetricResult, NamedResult};
use crate::stats::{self, BoxStats};

pub const PROPENSITY_MSE: &str = "propensity_mse";
pub const PROPENSITY_FIGURE: &str = "propensity_figure";

const FIGURE_SIZE: (u32, u32) = (900, 400);
const HISTOGRAM_BINS: usize = 20;

/// Propensity mean squared error of a source classifier.
///
/// Real and synthetic rows are stacked with the source indicator and an
/// L2-regularised logistic regression predicts the indicator from the other
/// columns. The score is `mean((p - 0.5)^2)`, so indistinguishable tables
/// score near 0 and perfectly separable ones approach 0.25.
#[derive(Debug, Clone, Copy)]
pub struct DiscriminabilityScore {
    pub max_iter: usize,
    pub tolerance: f64,
}

impl Default for DiscriminabilityScore {
    fn default() -> Self {
        Self {
            max_iter: 300,
            tolerance: 1e-4,
        }
    }
}

impl DiscriminabilityScore {
    pub fn new(max_iter: usize) -> Self {
        Self {
            max_iter,
            ..Self::default()
        }
    }

    /// Predicted probability of being synthetic for every stacked row,
    /// with the row's true source flag.
    pub fn propensities(&self, pair: &TablePair) -> Result<(Vec<f64>, Vec<f64>), EvalError> {
        let combined = tag_source(&pair.real, &pair.synthetic)?;
        let rows = combined.row_count();
        if pair.real.row_count() == 0 || pair.synthetic.row_count() == 0 {
            return Err(EvalError::metric(
                self.name(),
                "both tables need at least one row",
            ));
        }

        let mut labels = Vec::new();
        let mut features = Vec::new();
        for column in combined.columns() {
            let values = dense_cells(self.name(), column)?;
            if column.name == SOURCE_COLUMN {
                labels = values;
            } else {
                features.push(standardized(values));
            }
        }

        let design = DMatrix::from_fn(rows, features.len(), |row, col| features[col][row]);
        let fit = fit_logistic(&design, &labels, self.max_iter, self.tolerance);
        if !fit.converged {
            warn!(
                comparator = self.name(),
                iterations = fit.iterations,
                "logistic regression did not converge; using current estimate"
            );
        }
        Ok((fit.probabilities, labels))
    }
}

/// Zero mean, unit population variance; constant columns become all zero.
fn standardized(values: Vec<f64>) -> Vec<f64> {
    let mean = stats::mean(&values).unwrap_or(0.0);
    let std = stats::std_dev(&values, 0).unwrap_or(0.0);
    values
        .into_iter()
        .map(|value| if std > 0.0 { (value - mean) / std } else { 0.0 })
        .collect()
}

impl PairComparator for DiscriminabilityScore {
    fn name(&self) -> &'static str {
        "propensity_score_logistic_regression"
    }

    fn compare(&self, pair: &TablePair) -> Result<Vec<NamedResult>, EvalError> {
        let (probabilities, labels) = self.propensities(pair)?;
        let mse = probabilities
            .iter()
            .map(|p| (p - 0.5).powi(2))
            .sum::<f64>()
            / probabilities.len() as f64;

        let (real, synthetic): (Vec<(f64, f64)>, Vec<(f64, f64)>) = probabilities
            .iter()
            .copied()
            .zip(labels.iter().copied())
            .partition(|(_, label)| *label == 0.0);
        let real: Vec<f64> = real.into_iter().map(|(p, _)| p).collect();
        let synthetic: Vec<f64> = synthetic.into_iter().map(|(p, _)| p).collect();

        let mut canvas = FigureCanvas::new(FIGURE_SIZE.0, FIGURE_SIZE.1);
        canvas.draw(|root| {
            let panels = root.split_evenly((1, 2));
            histogram_panel(
                &panels[0],
                &[(real.as_slice(), REAL_COLOR), (synthetic.as_slice(), SYNTHETIC_COLOR)],
                HISTOGRAM_BINS,
            )?;
            box_panel(
                &panels[1],
                &[
                    (BoxStats::from_values(&real), REAL_COLOR),
                    (BoxStats::from_values(&synthetic), SYNTHETIC_COLOR),
                ],
            )
        })?;

        Ok(vec![
            NamedResult::new(PROPENSITY_MSE, MetricResult::Scalar(mse)),
            NamedResult::new(PROPENSITY_FIGURE, MetricResult::Image(canvas.finish()?)),
        ])
    }
}

/// Result of [`fit_logistic`]. `coefficients[0]` is the intercept.
#[derive(Debug, Clone)]
pub struct LogisticFit {
    pub coefficients: Vec<f64>,
    pub probabilities: Vec<f64>,
    pub iterations: usize,
    pub converged: bool,
}

/// Newton (IRLS) fit of a logistic regression with an unpenalised intercept
/// and unit L2 penalty on the feature weights.
///
/// Deterministic: starts from zero weights and stops once the largest
/// Newton step falls below `tolerance` or after `max_iter` steps.
pub fn fit_logistic(
    features: &DMatrix<f64>,
    labels: &[f64],
    max_iter: usize,
    tolerance: f64,
) -> LogisticFit {
    let rows = features.nrows();
    let width = features.ncols() + 1;
    let design = DMatrix::from_fn(rows, width, |row, col| {
        if col == 0 { 1.0 } else { features[(row, col - 1)] }
    });
    let targets = DVector::from_column_slice(labels);
    let mut penalty = DMatrix::<f64>::identity(width, width);
    penalty[(0, 0)] = 0.0;

    let mut weights = DVector::<f64>::zeros(width);
    let mut probabilities = predict(&design, &weights);
    let mut iterations = 0;
    let mut converged = false;

    while iterations < max_iter {
        iterations += 1;
        let gradient = design.tr_mul(&(&probabilities - &targets)) + &penalty * &weights;
        let curvature = probabilities.map(|p| (p * (1.0 - p)).max(1e-10));
        let mut weighted = design.clone();
        for (row, scale) in curvature.iter().enumerate() {
            weighted.row_mut(row).scale_mut(*scale);
        }
        let hessian = design.tr_mul(&weighted) + &penalty;

        let Some(step) = solve(hessian, &gradient) else {
            break;
        };
        weights -= &step;
        probabilities = predict(&design, &weights);
        if step.amax() < tolerance {
            converged = true;
            break;
        }
    }

    LogisticFit {
        coefficients: weights.iter().copied().collect(),
        probabilities: probabilities.iter().copied().collect(),
        iterations,
        converged,
    }
}

fn solve(hessian: DMatrix<f64>, gradient: &DVector<f64>) -> Option<DVector<f64>> {
    match hessian.clone().cholesky() {
        Some(cholesky) => Some(cholesky.solve(gradient)),
        None => hessian.lu().solve(gradient),
    }
}

fn predict(design: &DMatrix<f64>, weights: &DVector<f64>) -> DVector<f64> {
    (design * weights).map(sigmoid)
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}
