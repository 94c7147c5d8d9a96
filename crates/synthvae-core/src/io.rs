use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::role::{ColumnRole, RoleTable};
use crate::table::{Column, Table, Value};

const MISSING_MARKERS: [&str; 5] = ["", "NaN", "nan", "NA", "null"];

/// Parse one raw CSV cell according to the column role.
///
/// Categorical and temporal cells stay text; temporal parsing happens in the
/// aligner so it can report the offending row. Continuous cells try `i64`,
/// then `f64`, and fall back to text so table-level validation can name them.
pub fn parse_cell(raw: &str, role: ColumnRole) -> Value {
    let trimmed = raw.trim();
    if MISSING_MARKERS.contains(&trimmed) {
        return Value::Missing;
    }
    match role {
        ColumnRole::Categorical | ColumnRole::Temporal => Value::Text(raw.to_string()),
        ColumnRole::Continuous => {
            if let Ok(value) = trimmed.parse::<i64>() {
                Value::Int(value)
            } else if let Ok(value) = trimmed.parse::<f64>() {
                Value::float(value)
            } else {
                Value::Text(raw.to_string())
            }
        }
    }
}

/// Read a CSV file with a header row.
pub fn read_table_csv(path: &Path, roles: &RoleTable) -> Result<Table> {
    let file = File::open(path)?;
    read_table_from_reader(file, roles)
}

/// Read CSV from any reader; columns missing from `roles` are continuous.
pub fn read_table_from_reader<R: Read>(reader: R, roles: &RoleTable) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let column_roles: Vec<ColumnRole> = headers.iter().map(|name| roles.role(name)).collect();
    let mut values: Vec<Vec<Value>> = vec![Vec::new(); headers.len()];

    for (row_idx, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() != headers.len() {
            return Err(Error::Schema(format!(
                "csv row {} has {} fields, expected {}",
                row_idx + 1,
                record.len(),
                headers.len()
            )));
        }
        for (idx, raw) in record.iter().enumerate() {
            values[idx].push(parse_cell(raw, column_roles[idx]));
        }
    }

    let columns = headers
        .into_iter()
        .zip(values)
        .map(|(name, values)| Column::new(name, values))
        .collect();
    Table::new(columns)
}

/// Write a table as CSV, returning the number of bytes written.
pub fn write_table_csv(path: &Path, table: &Table) -> Result<u64> {
    let file = File::create(path)?;
    write_table_to_writer(BufWriter::new(file), table)
}

pub fn write_table_to_writer<W: Write>(writer: W, table: &Table) -> Result<u64> {
    let counting = CountingWriter::new(writer);
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(counting);

    writer.write_record(table.column_names())?;
    for row_idx in 0..table.row_count() {
        let record: Vec<String> = table
            .row(row_idx)
            .into_iter()
            .map(|value| value.label())
            .collect();
        writer.write_record(&record)?;
    }

    writer.flush()?;
    let counting = writer
        .into_inner()
        .map_err(|err| Error::Io(err.into_error()))?;
    Ok(counting.bytes_written())
}

struct CountingWriter<W: Write> {
    inner: W,
    bytes: u64,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, bytes: 0 }
    }

    fn bytes_written(&self) -> u64 {
        self.bytes
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let size = self.inner.write(buf)?;
        self.bytes = self.bytes.saturating_add(size as u64);
        Ok(size)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles() -> RoleTable {
        RoleTable::new(
            &["id".to_string(), "gender".to_string(), "admittime".to_string()],
            &["gender".to_string()],
            &["admittime".to_string()],
        )
    }

    #[test]
    fn parse_cell_follows_role() {
        assert_eq!(parse_cell("12", ColumnRole::Continuous), Value::Int(12));
        assert_eq!(parse_cell("1.5", ColumnRole::Continuous), Value::Float(1.5));
        assert_eq!(parse_cell("12", ColumnRole::Categorical), Value::text("12"));
        assert_eq!(parse_cell("NA", ColumnRole::Temporal), Value::Missing);
        assert_eq!(parse_cell("abc", ColumnRole::Continuous), Value::text("abc"));
    }

    #[test]
    fn reads_csv_with_roles() {
        let data = "id,gender,admittime,weight\n1,F,2020-01-01,70.5\n2,,2020-01-02,\n";
        let table = read_table_from_reader(data.as_bytes(), &roles()).expect("read csv");
        assert_eq!(table.row_count(), 2);
        assert_eq!(
            table.column("gender").unwrap().values,
            vec![Value::text("F"), Value::Missing]
        );
        assert_eq!(
            table.column("weight").unwrap().values,
            vec![Value::Float(70.5), Value::Missing]
        );
    }

    #[test]
    fn write_reports_bytes_and_reads_back() {
        let table = Table::from_rows(
            &["id", "gender"],
            vec![
                vec![Value::Int(1), Value::text("F")],
                vec![Value::Int(2), Value::Missing],
            ],
        )
        .expect("table");
        let mut buffer = Vec::new();
        let bytes = write_table_to_writer(&mut buffer, &table).expect("write");
        assert_eq!(bytes as usize, buffer.len());
        let back = read_table_from_reader(buffer.as_slice(), &roles()).expect("read");
        assert_eq!(back, table);
    }
}
