//! Column alignment and encoding for a real/synthetic table pair.
//!
//! Every operation takes the pair by reference and returns new tables; the
//! caller's inputs are never modified.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime};
pub use synthvae_core::SOURCE_COLUMN;
use synthvae_core::{Column, Error, Result, Table, TableSide, Value};

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// A real table and a synthetic table sharing one column schema.
#[derive(Debug, Clone, PartialEq)]
pub struct TablePair {
    pub real: Table,
    pub synthetic: Table,
}

impl TablePair {
    pub fn new(real: Table, synthetic: Table) -> Self {
        Self { real, synthetic }
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.real.column_names()
    }

    /// The same column from both sides.
    pub fn columns(&self, name: &str) -> Result<(&Column, &Column)> {
        Ok((
            self.real.require_column(name, TableSide::Real)?,
            self.synthetic.require_column(name, TableSide::Synthetic)?,
        ))
    }

    fn map_both<F>(&self, mut f: F) -> TablePair
    where
        F: FnMut(&Table) -> Table,
    {
        TablePair {
            real: f(&self.real),
            synthetic: f(&self.synthetic),
        }
    }
}

/// Project both tables onto the same ordered column subset.
pub fn select_columns(real: &Table, synthetic: &Table, columns: &[String]) -> Result<TablePair> {
    Ok(TablePair {
        real: real.select(columns, TableSide::Real)?,
        synthetic: synthetic.select(columns, TableSide::Synthetic)?,
    })
}

/// Stack real rows over synthetic rows and append the source indicator.
pub fn tag_source(real: &Table, synthetic: &Table) -> Result<Table> {
    for (side, table) in [(TableSide::Real, real), (TableSide::Synthetic, synthetic)] {
        if table.column(SOURCE_COLUMN).is_some() {
            return Err(Error::Schema(format!(
                "{side} table already has a '{SOURCE_COLUMN}' column"
            )));
        }
    }
    if !real.same_schema(synthetic) {
        return Err(Error::Schema(format!(
            "real columns [{}] differ from synthetic columns [{}]",
            real.column_names().join(", "),
            synthetic.column_names().join(", ")
        )));
    }

    let mut combined = real.clone();
    combined.append_rows(synthetic)?;

    let indicator = std::iter::repeat_n(Value::Int(0), real.row_count())
        .chain(std::iter::repeat_n(Value::Int(1), synthetic.row_count()))
        .collect();
    combined.push_column(Column::new(SOURCE_COLUMN, indicator))?;
    Ok(combined)
}

/// Inverse of [`tag_source`].
pub fn split_by_source(combined: &Table) -> Result<TablePair> {
    let indicator = combined.require_column(SOURCE_COLUMN, TableSide::Combined)?;

    let mut real_rows = Vec::new();
    let mut synthetic_rows = Vec::new();
    for (row, value) in indicator.values.iter().enumerate() {
        match value.as_f64() {
            Some(flag) if flag == 0.0 => real_rows.push(row),
            Some(flag) if flag == 1.0 => synthetic_rows.push(row),
            _ => {
                return Err(Error::Transform {
                    column: SOURCE_COLUMN.to_string(),
                    row,
                    reason: format!("expected 0 or 1, found '{value}'"),
                });
            }
        }
    }

    let mut stripped = combined.clone();
    stripped.remove_column(SOURCE_COLUMN);
    Ok(TablePair {
        real: stripped.take_rows(&real_rows),
        synthetic: stripped.take_rows(&synthetic_rows),
    })
}

/// Replace timestamp text with nanoseconds since the Unix epoch.
pub fn encode_temporal(pair: &TablePair, temporal_columns: &[String]) -> Result<TablePair> {
    for column in temporal_columns {
        pair.columns(column)?;
    }
    if temporal_columns.is_empty() {
        return Ok(pair.clone());
    }

    let mut combined = tag_source(&pair.real, &pair.synthetic)?;
    let real_rows = pair.real.row_count();

    for name in temporal_columns {
        let Some(column) = combined.column_mut(name) else {
            continue;
        };
        let mut encoded = Vec::with_capacity(column.len());
        for (row, value) in column.values.iter().enumerate() {
            encoded.push(encode_timestamp(name, row, real_rows, value)?);
        }
        column.values = encoded;
    }

    split_by_source(&combined)
}

fn encode_timestamp(column: &str, row: usize, real_rows: usize, value: &Value) -> Result<Value> {
    if value.is_missing() {
        return Ok(Value::Missing);
    }
    let (side, side_row) = if row < real_rows {
        (TableSide::Real, row)
    } else {
        (TableSide::Synthetic, row - real_rows)
    };
    let reason = match value {
        Value::Text(raw) => match parse_timestamp_nanos(raw) {
            Some(nanos) => return Ok(Value::Int(nanos)),
            None => format!("unparsable timestamp '{raw}' in {side} table"),
        },
        other => format!("expected timestamp text, found '{other}' in {side} table"),
    };
    Err(Error::Transform {
        column: column.to_string(),
        row: side_row,
        reason,
    })
}

/// Parse a timestamp into nanoseconds since 1970-01-01T00:00:00.
pub fn parse_timestamp_nanos(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    let datetime = DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;
    datetime.and_utc().timestamp_nanos_opt()
}

/// One-hot expand categorical columns over the categories of both tables.
pub fn encode_categorical(pair: &TablePair, categorical_columns: &[String]) -> Result<TablePair> {
    for column in categorical_columns {
        pair.columns(column)?;
    }
    if categorical_columns.is_empty() {
        return Ok(pair.clone());
    }

    let mut combined = tag_source(&pair.real, &pair.synthetic)?;

    for name in categorical_columns {
        let Some(source) = combined.remove_column(name) else {
            continue;
        };
        let categories: BTreeSet<String> = source
            .values
            .iter()
            .filter(|value| !value.is_missing())
            .map(Value::label)
            .collect();

        for category in &categories {
            let indicator = source
                .values
                .iter()
                .map(|value| {
                    let hit = !value.is_missing() && value.label() == *category;
                    Value::Int(i64::from(hit))
                })
                .collect();
            let indicator_name = format!("{name}_{category}");
            if combined.column(&indicator_name).is_some() {
                return Err(Error::Schema(format!(
                    "one-hot column '{indicator_name}' of categorical feature '{name}' collides with an existing column"
                )));
            }
            combined.push_column(Column::new(indicator_name, indicator))?;
        }
    }

    split_by_source(&combined)
}

/// Replace every missing cell with `0`.
pub fn fill_missing(pair: &TablePair) -> TablePair {
    pair.map_both(|table| {
        let mut filled = table.clone();
        for name in table.column_names() {
            if let Some(column) = filled.column_mut(name) {
                for value in column.values.iter_mut().filter(|value| value.is_missing()) {
                    *value = Value::Int(0);
                }
            }
        }
        filled
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn pair() -> TablePair {
        let real = Table::from_rows(
            &["age", "gender", "ADMITTIME"],
            vec![
                vec![Value::Int(40), Value::text("F"), Value::text("1970-01-01 00:00:01")],
                vec![Value::Missing, Value::text("M"), Value::Missing],
            ],
        )
        .unwrap();
        let synthetic = Table::from_rows(
            &["age", "gender", "ADMITTIME"],
            vec![vec![Value::Int(38), Value::text("X"), Value::text("1970-01-02")]],
        )
        .unwrap();
        TablePair::new(real, synthetic)
    }

    #[test]
    fn select_names_the_missing_side() {
        let p = pair();
        let narrow = p
            .synthetic
            .select(&names(&["age"]), TableSide::Synthetic)
            .unwrap();
        let err = select_columns(&p.real, &narrow, &names(&["age", "gender"])).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingColumn { side: TableSide::Synthetic, .. }
        ));
    }

    #[test]
    fn tag_source_appends_indicator_after_real_rows() {
        let p = pair();
        let combined = tag_source(&p.real, &p.synthetic).unwrap();
        assert_eq!(combined.row_count(), 3);
        assert_eq!(
            combined.column(SOURCE_COLUMN).unwrap().values,
            vec![Value::Int(0), Value::Int(0), Value::Int(1)]
        );
        assert_eq!(p.real.column_count(), 3, "input must stay untouched");
    }

    #[test]
    fn tag_source_rejects_existing_indicator() {
        let table = Table::from_rows(&[SOURCE_COLUMN], vec![vec![Value::Int(0)]]).unwrap();
        assert!(matches!(tag_source(&table, &table), Err(Error::Schema(_))));
    }

    #[test]
    fn split_rejects_unknown_flags() {
        let table =
            Table::from_rows(&["a", SOURCE_COLUMN], vec![vec![Value::Int(1), Value::Int(2)]])
                .unwrap();
        assert!(matches!(
            split_by_source(&table),
            Err(Error::Transform { row: 0, .. })
        ));
    }

    #[test]
    fn temporal_values_become_epoch_nanoseconds() {
        let encoded = encode_temporal(&pair(), &names(&["ADMITTIME"])).unwrap();
        assert_eq!(
            encoded.real.column("ADMITTIME").unwrap().values,
            vec![Value::Int(1_000_000_000), Value::Missing]
        );
        assert_eq!(
            encoded.synthetic.column("ADMITTIME").unwrap().values,
            vec![Value::Int(86_400 * 1_000_000_000)]
        );
    }

    #[test]
    fn unparsable_timestamp_is_a_transform_error() {
        let mut p = pair();
        p.synthetic.column_mut("ADMITTIME").unwrap().values[0] = Value::text("yesterday");
        let err = encode_temporal(&p, &names(&["ADMITTIME"])).unwrap_err();
        match err {
            Error::Transform { column, row, reason } => {
                assert_eq!(column, "ADMITTIME");
                assert_eq!(row, 0);
                assert!(reason.contains("yesterday"));
                assert!(reason.contains("synthetic"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn one_hot_uses_union_of_categories() {
        let encoded = encode_categorical(&pair(), &names(&["gender"])).unwrap();
        let expected = vec!["age", "ADMITTIME", "gender_F", "gender_M", "gender_X"];
        assert_eq!(encoded.real.column_names(), expected);
        assert_eq!(encoded.synthetic.column_names(), expected);
        assert_eq!(
            encoded.synthetic.row(0)[2..].to_vec(),
            vec![&Value::Int(0), &Value::Int(0), &Value::Int(1)]
        );
    }

    #[test]
    fn encoders_without_columns_leave_indicator_named_feature_alone() {
        let table = Table::from_rows(
            &["id", SOURCE_COLUMN],
            vec![vec![Value::Int(1), Value::Int(7)]],
        )
        .unwrap();
        let p = TablePair::new(table.clone(), table);
        assert_eq!(encode_temporal(&p, &[]).unwrap(), p);
        assert_eq!(encode_categorical(&p, &[]).unwrap(), p);
    }

    #[test]
    fn one_hot_collision_names_feature_and_indicator() {
        let mut p = pair();
        for table in [&mut p.real, &mut p.synthetic] {
            let rows = table.row_count();
            table
                .push_column(Column::new("gender_F", vec![Value::Int(0); rows]))
                .unwrap();
        }
        match encode_categorical(&p, &names(&["gender"])).unwrap_err() {
            Error::Schema(message) => {
                assert!(message.contains("'gender_F'"), "{message}");
                assert!(message.contains("'gender'"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn fill_missing_zeroes_each_side() {
        let filled = fill_missing(&pair());
        assert_eq!(filled.real.column("age").unwrap().values[1], Value::Int(0));
        assert_eq!(filled.real.column("ADMITTIME").unwrap().values[1], Value::Int(0));
        assert_eq!(filled.synthetic, pair().synthetic);
    }
}
