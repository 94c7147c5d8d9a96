//! Statistical comparators run against an aligned real/synthetic pair.
//!
//! Column comparators produce one result per configured column; pair
//! comparators consume the whole encoded pair.

mod collision;
mod describe;
mod distribution;
mod gower;
mod missingness;
mod projection;
mod propensity;
mod utility;

pub use collision::RowCollisionCheck;
pub use describe::DescriptiveComparison;
pub use distribution::DistributionComparison;
pub use gower::MixedDistanceSummary;
pub use missingness::MissingnessComparison;
pub use projection::ProjectionComparison;
pub use propensity::{DiscriminabilityScore, LogisticFit, fit_logistic};
pub use utility::UtilityDistance;

use synthvae_core::{Column, ColumnRole};

use crate::align::TablePair;
use crate::errors::EvalError;
use crate::model::{MetricResult, NamedResult};

/// A comparator evaluated once per column.
pub trait ColumnComparator {
    /// Family name, also accepted in `disabled_metrics`.
    fn kind(&self) -> &'static str;

    /// Suffix of the bundle name `{column}_{suffix}`.
    fn suffix(&self) -> &'static str;

    fn compare(
        &self,
        pair: &TablePair,
        column: &str,
        role: ColumnRole,
    ) -> Result<MetricResult, EvalError>;

    fn metric_name(&self, column: &str) -> String {
        format!("{column}_{}", self.suffix())
    }
}

/// A comparator evaluated once on the whole pair.
pub trait PairComparator {
    fn name(&self) -> &'static str;

    fn compare(&self, pair: &TablePair) -> Result<Vec<NamedResult>, EvalError>;
}

/// Non-missing cells as `f64`, failing on text.
pub(crate) fn numeric_cells(metric: &str, column: &Column) -> Result<Vec<f64>, EvalError> {
    if let Some((row, value)) = column.first_non_numeric() {
        return Err(EvalError::metric(
            metric,
            format!(
                "column '{}' holds non-numeric value '{value}' at row {row}",
                column.name
            ),
        ));
    }
    Ok(column.numeric_values())
}

/// Every cell as `f64`; text and missing cells are errors.
pub(crate) fn dense_cells(metric: &str, column: &Column) -> Result<Vec<f64>, EvalError> {
    column
        .values
        .iter()
        .enumerate()
        .map(|(row, value)| {
            value.as_f64().ok_or_else(|| {
                EvalError::metric(
                    metric,
                    format!(
                        "column '{}' needs numeric values, found '{value}' at row {row}",
                        column.name
                    ),
                )
            })
        })
        .collect()
}
