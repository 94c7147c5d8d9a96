use crate::align::TablePair;
use crate::errors::EvalError;
use crate::metrics::{PairComparator, dense_cells};
use crate::model::{MetricResult, NamedResult};

pub const PMSE: &str = "pMSE";

/// Voas-Williams style distance between two numeric tables.
///
/// Each cell contributes `(s - r)^2 / ((s + r) / 2)`; a zero denominator
/// contributes 0. The sum is divided by `8 * (rows_real + rows_synthetic)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UtilityDistance;

impl UtilityDistance {
    pub fn statistic(&self, pair: &TablePair) -> Result<f64, EvalError> {
        let name = self.name();
        let real_names = pair.real.column_names();
        let synthetic_names = pair.synthetic.column_names();
        if real_names != synthetic_names {
            return Err(EvalError::metric(
                name,
                format!(
                    "column names differ: real [{}], synthetic [{}]",
                    real_names.join(", "),
                    synthetic_names.join(", ")
                ),
            ));
        }

        let mut total = 0.0;
        for (real, synthetic) in pair.real.columns().iter().zip(pair.synthetic.columns()) {
            let real = dense_cells(name, real)?;
            let synthetic = dense_cells(name, synthetic)?;
            total += real
                .iter()
                .zip(&synthetic)
                .map(|(r, s)| cell_ratio(*r, *s))
                .sum::<f64>();
        }

        let rows = pair.real.row_count() + pair.synthetic.row_count();
        if rows == 0 {
            return Ok(0.0);
        }
        Ok(total / (8.0 * rows as f64))
    }
}

fn cell_ratio(real: f64, synthetic: f64) -> f64 {
    let n = (synthetic - real).powi(2);
    let d = (synthetic + real) / 2.0;
    let ratio = n / d;
    if ratio.is_finite() { ratio } else { 0.0 }
}

impl PairComparator for UtilityDistance {
    fn name(&self) -> &'static str {
        "voas_williams_statistic"
    }

    fn compare(&self, pair: &TablePair) -> Result<Vec<NamedResult>, EvalError> {
        Ok(vec![NamedResult::new(
            PMSE,
            MetricResult::Scalar(self.statistic(pair)?),
        )])
    }
}
