use std::path::PathBuf;

use synthvae_core::{ColumnRole, RoleTable, Table, Value, read_table_csv, write_table_csv};

fn temp_out_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("synthvae_core_{label}_{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn roles() -> RoleTable {
    RoleTable::from_entries(vec![
        ("ROW_ID".to_string(), ColumnRole::Continuous),
        ("gender".to_string(), ColumnRole::Categorical),
        ("ADMITTIME".to_string(), ColumnRole::Temporal),
        ("age".to_string(), ColumnRole::Continuous),
    ])
}

#[test]
fn csv_file_round_trip_preserves_cells() {
    let table = Table::from_rows(
        &["ROW_ID", "gender", "ADMITTIME", "age"],
        vec![
            vec![
                Value::Int(0),
                Value::text("F"),
                Value::text("2130-01-01 10:00:00"),
                Value::Float(54.5),
            ],
            vec![
                Value::Int(1),
                Value::Missing,
                Value::text("2131-06-12 08:30:00"),
                Value::Int(61),
            ],
        ],
    )
    .expect("table");

    let dir = temp_out_dir("roundtrip");
    let path = dir.join("table.csv");
    let bytes = write_table_csv(&path, &table).expect("write csv");
    assert_eq!(bytes, std::fs::metadata(&path).expect("metadata").len());

    let back = read_table_csv(&path, &roles()).expect("read csv");
    assert_eq!(back, table);
}

#[test]
fn values_serialize_untagged() {
    let values = vec![
        Value::Missing,
        Value::Int(3),
        Value::Float(1.5),
        Value::text("x"),
    ];
    let json = serde_json::to_string(&values).expect("serialize");
    assert_eq!(json, r#"[null,3,1.5,"x"]"#);
}

#[test]
fn ragged_csv_is_a_schema_error() {
    let dir = temp_out_dir("ragged");
    let path = dir.join("bad.csv");
    std::fs::write(&path, "a,b\n1,2\n3\n").expect("write fixture");
    let err = read_table_csv(&path, &roles()).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("csv"), "unexpected error: {message}");
}
