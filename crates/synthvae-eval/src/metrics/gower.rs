use synthvae_core::{Column, Value};

use crate::align::TablePair;
use crate::errors::EvalError;
use crate::metrics::PairComparator;
use crate::model::{MetricResult, NamedResult};
use crate::stats;

pub const AVERAGE_MIN: &str = "average_min_gower_distance";
pub const AVERAGE_MAX: &str = "average_max_gower_distance";

/// Gower distance summary from each synthetic row to the real rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct MixedDistanceSummary;

/// How one column contributes to a row distance.
enum Scale {
    /// Absolute difference over the range; `None` for a constant column.
    Numeric(Option<f64>),
    Nominal,
}

impl Scale {
    fn of(real: &Column, synthetic: &Column) -> Self {
        if !(real.is_numeric() && synthetic.is_numeric()) {
            return Scale::Nominal;
        }
        let mut values = real.numeric_values();
        values.extend(synthetic.numeric_values());
        let range = stats::min_max(&values)
            .map(|(lo, hi)| hi - lo)
            .filter(|range| *range > 0.0);
        Scale::Numeric(range)
    }

    fn distance(&self, a: &Value, b: &Value) -> f64 {
        match (a.is_missing(), b.is_missing()) {
            (true, true) => return 0.0,
            (true, false) | (false, true) => return 1.0,
            (false, false) => {}
        }
        match self {
            Scale::Numeric(None) => 0.0,
            Scale::Numeric(Some(range)) => match (a.as_f64(), b.as_f64()) {
                (Some(a), Some(b)) => ((a - b).abs() / range).min(1.0),
                _ => 1.0,
            },
            Scale::Nominal => {
                if a.join_key() == b.join_key() {
                    0.0
                } else {
                    1.0
                }
            }
        }
    }
}

impl MixedDistanceSummary {
    /// Per synthetic row, the minimum and maximum distance to any real row.
    pub fn row_extremes(&self, pair: &TablePair) -> Result<Vec<(f64, f64)>, EvalError> {
        let names = pair.real.column_names();
        if names.is_empty() {
            return Err(EvalError::metric(self.name(), "no columns to compare"));
        }
        if pair.real.row_count() == 0 || pair.synthetic.row_count() == 0 {
            return Err(EvalError::metric(
                self.name(),
                "both tables need at least one row",
            ));
        }

        let mut columns = Vec::with_capacity(names.len());
        for name in &names {
            let (real, synthetic) = pair.columns(name)?;
            columns.push((Scale::of(real, synthetic), real, synthetic));
        }
        let width = columns.len() as f64;

        let extremes = (0..pair.synthetic.row_count())
            .map(|s_row| {
                (0..pair.real.row_count())
                    .map(|r_row| {
                        columns
                            .iter()
                            .map(|(scale, real, synthetic)| {
                                scale.distance(&synthetic.values[s_row], &real.values[r_row])
                            })
                            .sum::<f64>()
                            / width
                    })
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), d| {
                        (lo.min(d), hi.max(d))
                    })
            })
            .collect();
        Ok(extremes)
    }
}

impl PairComparator for MixedDistanceSummary {
    fn name(&self) -> &'static str {
        "gower_analysis"
    }

    fn compare(&self, pair: &TablePair) -> Result<Vec<NamedResult>, EvalError> {
        let extremes = self.row_extremes(pair)?;
        let mins: Vec<f64> = extremes.iter().map(|(lo, _)| *lo).collect();
        let maxs: Vec<f64> = extremes.iter().map(|(_, hi)| *hi).collect();
        Ok(vec![
            NamedResult::new(
                AVERAGE_MIN,
                MetricResult::Scalar(stats::mean(&mins).unwrap_or(0.0)),
            ),
            NamedResult::new(
                AVERAGE_MAX,
                MetricResult::Scalar(stats::mean(&maxs).unwrap_or(0.0)),
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use synthvae_core::Table;

    fn mixed(rows: &[(Option<f64>, &str)]) -> Table {
        Table::from_rows(
            &["x", "c"],
            rows.iter()
                .map(|(x, c)| {
                    vec![
                        x.map(Value::Float).unwrap_or(Value::Missing),
                        Value::text(*c),
                    ]
                })
                .collect(),
        )
        .unwrap()
    }

    fn summary(pair: &TablePair) -> (f64, f64) {
        let results = MixedDistanceSummary.compare(pair).unwrap();
        (
            results[0].result.as_scalar().unwrap(),
            results[1].result.as_scalar().unwrap(),
        )
    }

    #[test]
    fn identical_tables_have_zero_minimum() {
        let table = mixed(&[(Some(0.0), "a"), (Some(10.0), "b")]);
        let (min, max) = summary(&TablePair::new(table.clone(), table));
        assert_eq!(min, 0.0);
        assert_eq!(max, 1.0);
    }

    #[test]
    fn numeric_difference_is_scaled_by_joint_range() {
        let real = mixed(&[(Some(0.0), "a")]);
        let synthetic = mixed(&[(Some(4.0), "a")]);
        let (min, max) = summary(&TablePair::new(real, synthetic));
        // |0 - 4| / 4 on x, 0 on c, averaged over two columns.
        assert_eq!(min, 0.5);
        assert_eq!(max, 0.5);
    }

    #[test]
    fn missing_cells_follow_the_match_rule() {
        let real = mixed(&[(None, "a"), (Some(1.0), "a")]);
        let synthetic = mixed(&[(None, "a")]);
        let extremes = MixedDistanceSummary
            .row_extremes(&TablePair::new(real, synthetic))
            .unwrap();
        assert_eq!(extremes, vec![(0.0, 0.5)]);
    }

    #[test]
    fn empty_synthetic_table_is_an_error() {
        let real = mixed(&[(Some(1.0), "a")]);
        let synthetic = mixed(&[]);
        assert!(MixedDistanceSummary
            .compare(&TablePair::new(real, synthetic))
            .is_err());
    }
}
