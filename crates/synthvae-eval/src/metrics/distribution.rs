use std::collections::BTreeSet;

use synthvae_core::{Column, ColumnRole};

use crate::align::TablePair;
use crate::errors::EvalError;
use crate::figure::{
    FigureCanvas, REAL_COLOR, SYNTHETIC_COLOR, Series, bar_panel, box_panel, line_panel,
    proportion_panel,
};
use crate::metrics::{ColumnComparator, numeric_cells};
use crate::model::{ImageArtifact, MetricResult};
use crate::stats::{self, BoxStats};

const CATEGORICAL_SIZE: (u32, u32) = (800, 800);
const CONTINUOUS_SIZE: (u32, u32) = (1200, 400);
const KDE_POINTS: usize = 200;

/// Distribution plots for one column, real in blue and synthetic in red.
///
/// Categorical columns get a 2x2 grid: counts and proportions for the real
/// table on top, the synthetic table below. Continuous and temporal columns
/// get density curves, box plots and cumulative sums side by side.
#[derive(Debug, Clone, Copy, Default)]
pub struct DistributionComparison;

impl ColumnComparator for DistributionComparison {
    fn kind(&self) -> &'static str {
        "distribution"
    }

    fn suffix(&self) -> &'static str {
        "figure"
    }

    fn compare(
        &self,
        pair: &TablePair,
        column: &str,
        role: ColumnRole,
    ) -> Result<MetricResult, EvalError> {
        let (real, synthetic) = pair.columns(column)?;
        let image = match role {
            ColumnRole::Categorical => categorical_figure(real, synthetic)?,
            ColumnRole::Continuous | ColumnRole::Temporal => {
                continuous_figure(self.kind(), real, synthetic)?
            }
        };
        Ok(MetricResult::Image(image))
    }
}

fn categorical_figure(
    real: &Column,
    synthetic: &Column,
) -> Result<ImageArtifact, EvalError> {
    let real_counts = stats::value_counts(&real.values);
    let synthetic_counts = stats::value_counts(&synthetic.values);
    let categories: BTreeSet<&String> = real_counts.keys().chain(synthetic_counts.keys()).collect();

    let aligned = |counts: &std::collections::BTreeMap<String, usize>| -> Vec<f64> {
        categories
            .iter()
            .map(|category| counts.get(*category).copied().unwrap_or(0) as f64)
            .collect()
    };
    let real_bars = aligned(&real_counts);
    let synthetic_bars = aligned(&synthetic_counts);

    let mut canvas = FigureCanvas::new(CATEGORICAL_SIZE.0, CATEGORICAL_SIZE.1);
    canvas.draw(|root| {
        let panels = root.split_evenly((2, 2));
        bar_panel(&panels[0], &real_bars, REAL_COLOR)?;
        proportion_panel(&panels[1], &shares(&real_bars))?;
        bar_panel(&panels[2], &synthetic_bars, SYNTHETIC_COLOR)?;
        proportion_panel(&panels[3], &shares(&synthetic_bars))
    })?;
    canvas.finish()
}

fn shares(counts: &[f64]) -> Vec<f64> {
    let total: f64 = counts.iter().sum();
    if total == 0.0 {
        return vec![0.0; counts.len()];
    }
    counts.iter().map(|count| count / total).collect()
}

fn continuous_figure(
    metric: &str,
    real: &Column,
    synthetic: &Column,
) -> Result<ImageArtifact, EvalError> {
    let real_values = numeric_cells(metric, real)?;
    let synthetic_values = numeric_cells(metric, synthetic)?;

    let mut joint = real_values.clone();
    joint.extend(&synthetic_values);
    let grid = match stats::min_max(&joint) {
        Some((lo, hi)) => {
            let pad = ((hi - lo) * 0.1).max(1e-9);
            stats::linspace(lo - pad, hi + pad, KDE_POINTS)
        }
        None => Vec::new(),
    };
    let density = |values: &[f64], color| {
        let points = match stats::scott_bandwidth(values) {
            Some(bandwidth) => grid
                .iter()
                .copied()
                .zip(stats::gaussian_kde(values, bandwidth, &grid))
                .collect(),
            None => Vec::new(),
        };
        Series::new(points, color)
    };
    let densities = [
        density(real_values.as_slice(), REAL_COLOR),
        density(synthetic_values.as_slice(), SYNTHETIC_COLOR),
    ];
    let boxes = [
        (BoxStats::from_values(&real_values), REAL_COLOR),
        (BoxStats::from_values(&synthetic_values), SYNTHETIC_COLOR),
    ];
    let sums = [
        Series::new(stats::cumulative_sum(&real.values), REAL_COLOR),
        Series::new(stats::cumulative_sum(&synthetic.values), SYNTHETIC_COLOR),
    ];

    let mut canvas = FigureCanvas::new(CONTINUOUS_SIZE.0, CONTINUOUS_SIZE.1);
    canvas.draw(|root| {
        let panels = root.split_evenly((1, 3));
        line_panel(&panels[0], &densities)?;
        box_panel(&panels[1], &boxes)?;
        line_panel(&panels[2], &sums)
    })?;
    canvas.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use synthvae_core::{Table, Value};

    fn pair(real: Vec<Value>, synthetic: Vec<Value>) -> TablePair {
        TablePair::new(
            Table::new(vec![Column::new("x", real)]).unwrap(),
            Table::new(vec![Column::new("x", synthetic)]).unwrap(),
        )
    }

    #[test]
    fn continuous_column_renders_wide_figure() {
        let p = pair(
            vec![Value::Float(1.0), Value::Float(2.5), Value::Missing, Value::Int(4)],
            vec![Value::Int(2), Value::Int(2), Value::Int(3)],
        );
        let result = DistributionComparison
            .compare(&p, "x", ColumnRole::Continuous)
            .unwrap();
        let image = result.as_image().unwrap();
        assert_eq!((image.width, image.height), CONTINUOUS_SIZE);
        assert!(!image.png_base64.is_empty());
    }

    #[test]
    fn categorical_column_renders_grid() {
        let p = pair(
            vec![Value::text("F"), Value::text("M"), Value::Missing],
            vec![Value::text("U")],
        );
        let result = DistributionComparison
            .compare(&p, "x", ColumnRole::Categorical)
            .unwrap();
        let image = result.as_image().unwrap();
        assert_eq!((image.width, image.height), CATEGORICAL_SIZE);
    }

    #[test]
    fn constant_and_empty_columns_still_render() {
        let p = pair(vec![Value::Int(3), Value::Int(3)], vec![Value::Missing]);
        assert!(DistributionComparison
            .compare(&p, "x", ColumnRole::Continuous)
            .is_ok());
    }

    #[test]
    fn metric_name_uses_figure_suffix() {
        assert_eq!(DistributionComparison.metric_name("age"), "age_figure");
    }

    #[test]
    fn shares_of_empty_counts_are_zero() {
        assert_eq!(shares(&[0.0, 0.0]), vec![0.0, 0.0]);
        assert_eq!(shares(&[1.0, 3.0]), vec![0.25, 0.75]);
    }
}
