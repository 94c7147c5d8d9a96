use std::fs;
use std::path::PathBuf;

use rstest::rstest;
use synthvae_core::{RoleTable, Table, Value, read_table_csv};
use synthvae_generate::{GenerateOptions, GenerationEngine, GenerationError, MarginalSampler};

fn real_table() -> Table {
    Table::from_rows(
        &["age", "gender", "ADMITTIME"],
        vec![
            vec![Value::Int(34), Value::text("F"), Value::text("2130-01-01 10:00:00")],
            vec![Value::Int(71), Value::text("M"), Value::text("2131-03-05 08:15:00")],
            vec![Value::Missing, Value::text("F"), Value::text("2129-11-20 23:59:59")],
            vec![Value::Int(55), Value::Missing, Value::text("2130-07-14 12:00:00")],
        ],
    )
    .expect("real table")
}

fn roles() -> RoleTable {
    RoleTable::new(
        &["age".to_string(), "gender".to_string(), "ADMITTIME".to_string()],
        &["gender".to_string()],
        &["ADMITTIME".to_string()],
    )
}

fn temp_out_dir(label: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!("synthvae_generate_{label}_{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).expect("create temp out dir");
    dir
}

fn options(label: &str, rows: usize) -> GenerateOptions {
    GenerateOptions {
        out_dir: temp_out_dir(label),
        rows,
        seed: 11,
        id_column: "ROW_ID".to_string(),
    }
}

#[test]
fn generate_is_deterministic() {
    let sampler = MarginalSampler::new(11);
    let result_a = GenerationEngine::new(options("run_a", 40))
        .run(&sampler, &real_table(), &roles())
        .expect("run generation A");
    let result_b = GenerationEngine::new(options("run_b", 40))
        .run(&sampler, &real_table(), &roles())
        .expect("run generation B");

    let csv_a = fs::read_to_string(&result_a.synthetic_path).expect("read synthetic.csv A");
    let csv_b = fs::read_to_string(&result_b.synthetic_path).expect("read synthetic.csv B");
    assert_eq!(csv_a, csv_b, "synthetic.csv should be deterministic");
}

#[rstest]
#[case(1)]
#[case(17)]
#[case(250)]
fn generate_respects_row_counts(#[case] rows: usize) {
    let result = GenerationEngine::new(options("rows", rows))
        .run(&MarginalSampler::new(2), &real_table(), &roles())
        .expect("run generation");
    assert_eq!(result.report.rows_generated, rows as u64);

    let written = read_table_csv(&result.synthetic_path, &roles()).expect("read back");
    assert_eq!(written.row_count(), rows);
    assert_eq!(written.column_names(), vec!["ROW_ID", "age", "gender", "ADMITTIME"]);
    assert_eq!(
        written.column("ROW_ID").expect("id column").values.last(),
        Some(&Value::Int(rows as i64 - 1))
    );
}

#[test]
fn report_is_written_next_to_csv() {
    let result = GenerationEngine::new(options("report", 10))
        .run(&MarginalSampler::new(5), &real_table(), &roles())
        .expect("run generation");
    let report_path = result.out_dir.join("generation_report.json");
    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(report_path).expect("read report"))
            .expect("parse report");
    assert_eq!(report["generator"], "marginal_sampler");
    assert_eq!(report["rows_requested"], 10);
    assert_eq!(report["columns"][1]["role"], "categorical");
}

#[test]
fn id_column_collision_is_rejected() {
    let mut opts = options("collision", 5);
    opts.id_column = "age".to_string();
    let err = GenerationEngine::new(opts)
        .run(&MarginalSampler::new(5), &real_table(), &roles())
        .unwrap_err();
    assert!(matches!(err, GenerationError::InvalidInput(_)));
}
