use std::collections::BTreeSet;

use synthvae_core::{Column, ColumnRole, Table, Value};

use crate::align::TablePair;
use crate::errors::EvalError;
use crate::metrics::{ColumnComparator, numeric_cells};
use crate::model::MetricResult;
use crate::stats;

const NUMERIC_STATISTICS: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

/// Side-by-side summary statistics for one column.
///
/// Continuous and temporal columns also get a `difference` column (real minus
/// synthetic); a statistic undefined on either side leaves that cell missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct DescriptiveComparison;

impl ColumnComparator for DescriptiveComparison {
    fn kind(&self) -> &'static str {
        "description"
    }

    fn suffix(&self) -> &'static str {
        "description"
    }

    fn compare(
        &self,
        pair: &TablePair,
        column: &str,
        role: ColumnRole,
    ) -> Result<MetricResult, EvalError> {
        let (real, synthetic) = pair.columns(column)?;
        let table = match role {
            ColumnRole::Categorical => {
                let (labels, real_stats, synthetic_stats) = categorical_summary(real, synthetic);
                summary_table(labels, real_stats, synthetic_stats, false)?
            }
            ColumnRole::Continuous | ColumnRole::Temporal => {
                let labels = NUMERIC_STATISTICS.iter().map(|s| s.to_string()).collect();
                summary_table(
                    labels,
                    numeric_summary(self.kind(), real)?,
                    numeric_summary(self.kind(), synthetic)?,
                    true,
                )?
            }
        };
        Ok(MetricResult::Table(table))
    }
}

fn stat(value: Option<f64>) -> Value {
    value.map(Value::float).unwrap_or(Value::Missing)
}

fn numeric_summary(metric: &str, column: &Column) -> Result<Vec<Value>, EvalError> {
    let values = numeric_cells(metric, column)?;
    let sorted = stats::sorted(&values);
    let bounds = stats::min_max(&values);
    Ok(vec![
        Value::Int(values.len() as i64),
        stat(stats::mean(&values)),
        stat(stats::std_dev(&values, 1)),
        stat(bounds.map(|(lo, _)| lo)),
        stat(stats::quantile_sorted(&sorted, 0.25)),
        stat(stats::quantile_sorted(&sorted, 0.5)),
        stat(stats::quantile_sorted(&sorted, 0.75)),
        stat(bounds.map(|(_, hi)| hi)),
    ])
}

fn categorical_summary(real: &Column, synthetic: &Column) -> (Vec<String>, Vec<Value>, Vec<Value>) {
    let real_counts = stats::value_counts(&real.values);
    let synthetic_counts = stats::value_counts(&synthetic.values);
    let categories: BTreeSet<&String> = real_counts.keys().chain(synthetic_counts.keys()).collect();

    let mut labels: Vec<String> = ["count", "unique", "top", "freq"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    labels.extend(categories.iter().map(|category| format!("count[{category}]")));

    let side = |counts: &std::collections::BTreeMap<String, usize>| {
        let total: usize = counts.values().sum();
        let (top, freq) = match stats::mode(counts) {
            Some((label, freq)) => (Value::text(label), Value::Int(freq as i64)),
            None => (Value::Missing, Value::Missing),
        };
        let mut values = vec![
            Value::Int(total as i64),
            Value::Int(counts.len() as i64),
            top,
            freq,
        ];
        values.extend(
            categories
                .iter()
                .map(|category| Value::Int(counts.get(*category).copied().unwrap_or(0) as i64)),
        );
        values
    };

    (labels, side(&real_counts), side(&synthetic_counts))
}

fn summary_table(
    labels: Vec<String>,
    real: Vec<Value>,
    synthetic: Vec<Value>,
    with_difference: bool,
) -> Result<Table, EvalError> {
    let mut columns = vec![
        Column::new("statistic", labels.into_iter().map(Value::Text).collect()),
        Column::new("real_data", real.clone()),
        Column::new("synthetic_data", synthetic.clone()),
    ];
    if with_difference {
        let difference = real
            .iter()
            .zip(&synthetic)
            .map(|(r, s)| match (r, s) {
                (Value::Int(r), Value::Int(s)) => Value::Int(r - s),
                _ => stat(r.as_f64().zip(s.as_f64()).map(|(r, s)| r - s)),
            })
            .collect();
        columns.push(Column::new("difference", difference));
    }
    Ok(Table::new(columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(real: Vec<Value>, synthetic: Vec<Value>) -> TablePair {
        TablePair::new(
            Table::new(vec![Column::new("x", real)]).unwrap(),
            Table::new(vec![Column::new("x", synthetic)]).unwrap(),
        )
    }

    fn describe(pair: &TablePair, role: ColumnRole) -> Table {
        match DescriptiveComparison.compare(pair, "x", role).unwrap() {
            MetricResult::Table(table) => table,
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[test]
    fn continuous_summary_has_difference_column() {
        let p = pair(
            vec![Value::Int(1), Value::Int(2), Value::Int(3), Value::Int(4)],
            vec![Value::Int(2), Value::Int(2), Value::Missing, Value::Int(2)],
        );
        let table = describe(&p, ColumnRole::Continuous);
        assert_eq!(
            table.column_names(),
            vec!["statistic", "real_data", "synthetic_data", "difference"]
        );
        let real = &table.column("real_data").unwrap().values;
        assert_eq!(real[0], Value::Int(4));
        assert_eq!(real[1], Value::Float(2.5));
        assert_eq!(real[4], Value::Float(1.75));
        let diff = &table.column("difference").unwrap().values;
        assert_eq!(diff[0], Value::Int(1));
        assert_eq!(diff[2].as_f64().unwrap(), real[2].as_f64().unwrap());
    }

    #[test]
    fn categorical_summary_has_no_difference() {
        let p = pair(
            vec![Value::text("F"), Value::text("M"), Value::text("F")],
            vec![Value::text("M"), Value::text("U")],
        );
        let table = describe(&p, ColumnRole::Categorical);
        assert_eq!(table.column_names(), vec!["statistic", "real_data", "synthetic_data"]);
        let labels: Vec<String> = table
            .column("statistic")
            .unwrap()
            .values
            .iter()
            .map(Value::label)
            .collect();
        assert_eq!(
            labels,
            vec!["count", "unique", "top", "freq", "count[F]", "count[M]", "count[U]"]
        );
        let real = &table.column("real_data").unwrap().values;
        assert_eq!(real[2], Value::text("F"));
        assert_eq!(real[6], Value::Int(0));
    }

    #[test]
    fn all_missing_column_reports_missing_statistics() {
        let p = pair(vec![Value::Missing], vec![Value::Int(1)]);
        let table = describe(&p, ColumnRole::Continuous);
        assert_eq!(table.column("real_data").unwrap().values[1], Value::Missing);
        let diff = &table.column("difference").unwrap().values;
        assert_eq!(diff[0], Value::Int(-1));
        assert_eq!(diff[1], Value::Missing);
    }

    #[test]
    fn undefined_std_keeps_difference_column() {
        let p = pair(vec![Value::Int(1), Value::Int(3)], vec![Value::Int(2)]);
        let table = describe(&p, ColumnRole::Continuous);
        assert_eq!(
            table.column_names(),
            vec!["statistic", "real_data", "synthetic_data", "difference"]
        );
        let diff = &table.column("difference").unwrap().values;
        assert_eq!(diff[0], Value::Int(1));
        assert_eq!(diff[1], Value::Float(0.0));
        assert_eq!(diff[2], Value::Missing);
        assert_eq!(diff[7], Value::Float(1.0));
    }

    #[test]
    fn text_in_continuous_column_fails() {
        let p = pair(vec![Value::text("a")], vec![Value::Int(1)]);
        assert!(matches!(
            DescriptiveComparison.compare(&p, "x", ColumnRole::Continuous),
            Err(EvalError::Metric { .. })
        ));
    }
}
