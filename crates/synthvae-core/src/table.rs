use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result, TableSide};

/// A single table cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Missing,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Build a float cell, mapping `NaN` to [`Value::Missing`].
    pub fn float(value: f64) -> Self {
        if value.is_nan() {
            Value::Missing
        } else {
            Value::Float(value)
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Value::Text(value.into())
    }

    pub fn is_missing(&self) -> bool {
        match self {
            Value::Missing => true,
            Value::Float(value) => value.is_nan(),
            _ => false,
        }
    }

    pub fn is_numeric(&self) -> bool {
        match self {
            Value::Int(_) => true,
            Value::Float(value) => !value.is_nan(),
            _ => false,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(value) => Some(*value as f64),
            Value::Float(value) if !value.is_nan() => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Text label used for category names and report cells.
    pub fn label(&self) -> String {
        match self {
            Value::Missing => String::new(),
            Value::Int(value) => value.to_string(),
            Value::Float(value) if value.is_nan() => String::new(),
            Value::Float(value) => value.to_string(),
            Value::Text(value) => value.clone(),
        }
    }

    /// Equality key for joins: numerically equal Int/Float cells share a key,
    /// text never collides with a number.
    pub fn join_key(&self) -> String {
        match self {
            Value::Missing => "null".to_string(),
            Value::Float(value) if value.is_nan() => "null".to_string(),
            Value::Int(value) => value.to_string(),
            Value::Float(value) if value.fract() == 0.0 && value.abs() < 9.0e15 => {
                (*value as i64).to_string()
            }
            Value::Float(value) => value.to_string(),
            Value::Text(value) => format!("'{}", value.replace('\\', "\\\\").replace('|', "\\|")),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_missing() {
            return f.write_str("NaN");
        }
        match self {
            Value::Int(value) => write!(f, "{value}"),
            Value::Float(value) => write!(f, "{value}"),
            Value::Text(value) => f.write_str(value),
            Value::Missing => f.write_str("NaN"),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::float(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

/// A named column of cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|value| value.is_missing()).count()
    }

    /// Non-missing numeric cells as `f64`, in row order.
    pub fn numeric_values(&self) -> Vec<f64> {
        self.values.iter().filter_map(Value::as_f64).collect()
    }

    /// True when every non-missing cell is numeric.
    pub fn is_numeric(&self) -> bool {
        self.values
            .iter()
            .all(|value| value.is_missing() || value.is_numeric())
    }

    /// Row index and value of the first non-missing, non-numeric cell.
    pub fn first_non_numeric(&self) -> Option<(usize, &Value)> {
        self.values
            .iter()
            .enumerate()
            .find(|(_, value)| !value.is_missing() && !value.is_numeric())
    }
}

/// An ordered collection of equally long, uniquely named columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Build a table, rejecting ragged or duplicate columns.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let mut table = Table::default();
        for column in columns {
            table.push_column(column)?;
        }
        Ok(table)
    }

    /// Build a table from row-major cells.
    pub fn from_rows(names: &[&str], rows: Vec<Vec<Value>>) -> Result<Self> {
        let mut columns: Vec<Column> = names
            .iter()
            .map(|name| Column::new(*name, Vec::with_capacity(rows.len())))
            .collect();
        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() != names.len() {
                return Err(Error::Schema(format!(
                    "row {row_idx} has {} cells, expected {}",
                    row.len(),
                    names.len()
                )));
            }
            for (column, value) in columns.iter_mut().zip(row) {
                column.values.push(value);
            }
        }
        Self::new(columns)
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|col| col.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|col| col.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|col| col.name == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|col| col.name == name)
    }

    /// Look up a column, reporting which side of a pair it was missing from.
    pub fn require_column(&self, name: &str, side: TableSide) -> Result<&Column> {
        self.column(name).ok_or_else(|| Error::MissingColumn {
            column: name.to_string(),
            side,
        })
    }

    /// Cells of one row, in column order.
    pub fn row(&self, index: usize) -> Vec<&Value> {
        self.columns
            .iter()
            .filter_map(|col| col.values.get(index))
            .collect()
    }

    pub fn push_column(&mut self, column: Column) -> Result<()> {
        if self.column(&column.name).is_some() {
            return Err(Error::Schema(format!(
                "duplicate column name: {}",
                column.name
            )));
        }
        if !self.columns.is_empty() && column.len() != self.row_count() {
            return Err(Error::Schema(format!(
                "column '{}' has {} rows, expected {}",
                column.name,
                column.len(),
                self.row_count()
            )));
        }
        self.columns.push(column);
        Ok(())
    }

    pub fn remove_column(&mut self, name: &str) -> Option<Column> {
        let index = self.column_index(name)?;
        Some(self.columns.remove(index))
    }

    /// Project onto `names`, in that order.
    pub fn select(&self, names: &[String], side: TableSide) -> Result<Table> {
        let mut seen = HashSet::new();
        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            if !seen.insert(name.as_str()) {
                return Err(Error::Schema(format!("column '{name}' selected twice")));
            }
            columns.push(self.require_column(name, side)?.clone());
        }
        Table::new(columns)
    }

    /// True when both tables have the same column names in the same order.
    pub fn same_schema(&self, other: &Table) -> bool {
        self.columns.len() == other.columns.len()
            && self
                .columns
                .iter()
                .zip(&other.columns)
                .all(|(left, right)| left.name == right.name)
    }

    /// Append the rows of `other`, which must share this table's schema.
    pub fn append_rows(&mut self, other: &Table) -> Result<()> {
        if self.columns.is_empty() {
            self.columns = other.columns.clone();
            return Ok(());
        }
        if !self.same_schema(other) {
            return Err(Error::Schema(format!(
                "cannot append rows: columns [{}] do not match [{}]",
                other.column_names().join(", "),
                self.column_names().join(", ")
            )));
        }
        for (column, extra) in self.columns.iter_mut().zip(&other.columns) {
            column.values.extend(extra.values.iter().cloned());
        }
        Ok(())
    }

    /// New table holding the given rows, in the given order.
    pub fn take_rows(&self, indices: &[usize]) -> Table {
        let columns = self
            .columns
            .iter()
            .map(|col| {
                let values = indices
                    .iter()
                    .filter_map(|idx| col.values.get(*idx).cloned())
                    .collect();
                Column::new(col.name.clone(), values)
            })
            .collect();
        Table { columns }
    }
}
