use std::fs;
use std::path::PathBuf;

use rstest::rstest;
use synthvae_config::EvaluationConfig;
use synthvae_core::{Table, Value, write_table_csv};
use synthvae_eval::metrics::{RowCollisionCheck, UtilityDistance};
use synthvae_eval::model::DISABLED_REASON;
use synthvae_eval::{EvaluateOptions, EvaluationEngine, Outcome, PairComparator, TablePair};

fn temp_out_dir(label: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!("synthvae_eval_{label}_{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).expect("create temp out dir");
    dir
}

fn admissions(rows: &[(i64, &str, Option<i64>, &str)]) -> Table {
    Table::from_rows(
        &["SUBJECT_ID", "ADMITTIME", "age", "gender"],
        rows.iter()
            .map(|(id, admit, age, gender)| {
                vec![
                    Value::Int(*id),
                    Value::text(*admit),
                    age.map(Value::Int).unwrap_or(Value::Missing),
                    Value::text(*gender),
                ]
            })
            .collect(),
    )
    .expect("admissions table")
}

fn real() -> Table {
    admissions(&[
        (1, "2130-01-01 10:00:00", Some(34), "F"),
        (2, "2131-03-05 08:15:00", Some(71), "M"),
        (3, "2129-11-20 23:59:59", None, "F"),
        (4, "2130-07-14 12:00:00", Some(55), "M"),
        (5, "2132-02-29 06:30:00", Some(48), "F"),
    ])
}

fn synthetic() -> Table {
    admissions(&[
        (10, "2130-02-01 11:00:00", Some(36), "F"),
        (11, "2131-03-05 08:15:00", Some(71), "M"),
        (12, "2128-05-02 01:00:00", Some(20), "M"),
        (13, "2130-09-09 09:09:09", Some(60), "F"),
    ])
}

fn config() -> EvaluationConfig {
    let mut config = EvaluationConfig::new(
        ["SUBJECT_ID", "ADMITTIME", "age", "gender"]
            .iter()
            .map(|name| name.to_string())
            .collect(),
    );
    config.categorical_features = vec!["gender".to_string()];
    config.time_features = vec!["ADMITTIME".to_string()];
    config
}

#[test]
fn full_run_produces_every_metric() {
    let result = EvaluationEngine::default()
        .run(&config(), &real(), &synthetic())
        .expect("evaluation");
    let bundle = &result.bundle;

    for column in ["SUBJECT_ID", "ADMITTIME", "age", "gender"] {
        assert!(bundle.table(&format!("{column}_description")).is_some());
        assert!(bundle.table(&format!("{column}_nulls")).is_some());
        assert!(bundle.image(&format!("{column}_figure")).is_some());
    }
    for scalar in [
        "pMSE",
        "average_min_gower_distance",
        "average_max_gower_distance",
        "propensity_mse",
        "number_of_rows",
    ] {
        assert!(bundle.scalar(scalar).is_some(), "missing scalar {scalar}");
    }
    assert!(bundle.table("same_row").is_some());
    assert!(bundle.image("propensity_figure").is_some());
    assert!(bundle.image("pca_evaluation_figure").is_some());
    assert_eq!(bundle.skipped().count(), 0);

    let pmse = bundle.scalar("propensity_mse").expect("propensity");
    assert!((0.0..=0.25).contains(&pmse));
}

#[test]
fn age_nulls_are_reported_as_percentages() {
    let result = EvaluationEngine::default()
        .run(&config(), &real(), &synthetic())
        .expect("evaluation");
    let nulls = result.bundle.table("age_nulls").expect("age nulls");
    assert_eq!(nulls.row_count(), 1);
    assert_eq!(nulls.columns()[0].values[0], Value::Float(20.0));
    assert_eq!(nulls.columns()[1].values[0], Value::Float(0.0));
}

#[test]
fn shared_row_is_detected_after_encoding() {
    let result = EvaluationEngine::default()
        .run(&config(), &real(), &synthetic())
        .expect("evaluation");
    assert_eq!(result.bundle.scalar("number_of_rows"), Some(1.0));
    let same_row = result.bundle.table("same_row").expect("same_row");
    assert_eq!(
        same_row.column("SUBJECT_ID_synthetic").expect("synthetic id").values,
        vec![Value::Int(11)]
    );
}

#[rstest]
#[case("description", "age_description")]
#[case("missingness", "gender_nulls")]
#[case("distribution", "ADMITTIME_figure")]
#[case("voas_williams_statistic", "voas_williams_statistic")]
#[case("gower_analysis", "gower_analysis")]
#[case("propensity_score_logistic_regression", "propensity_score_logistic_regression")]
#[case("collision_analysis", "collision_analysis")]
#[case("pca_evaluation", "pca_evaluation")]
fn disabled_metric_is_skipped(#[case] disabled: &str, #[case] entry: &str) {
    let mut config = config();
    config.evaluation.disabled_metrics = vec![disabled.to_string()];
    let result = EvaluationEngine::default()
        .run(&config, &real(), &synthetic())
        .expect("evaluation");
    let entry = result.bundle.entry(entry).expect("entry present");
    assert_eq!(entry.skip_reason(), Some(DISABLED_REASON));
}

#[test]
fn failing_pair_comparator_does_not_stop_the_others() {
    // One row per side is too few for the projection; everything else runs.
    let real = real().take_rows(&[0]);
    let synthetic = synthetic().take_rows(&[0]);
    let result = EvaluationEngine::default()
        .run(&config(), &real, &synthetic)
        .expect("evaluation");
    let pca = result.bundle.entry("pca_evaluation").expect("pca entry");
    assert!(pca.is_skipped());
    assert!(pca.skip_reason().expect("reason").contains("pca_evaluation"));
    assert!(result.bundle.table("age_description").is_some());
    assert!(result.bundle.scalar("pMSE").is_some());
}

#[test]
fn unparsable_timestamp_aborts_the_run() {
    let mut synthetic = synthetic();
    synthetic
        .column_mut("ADMITTIME")
        .expect("ADMITTIME")
        .values[2] = Value::text("not a date");
    let err = EvaluationEngine::default()
        .run(&config(), &real(), &synthetic)
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("ADMITTIME"), "{message}");
    assert!(message.contains("not a date"), "{message}");
}

#[test]
fn run_files_writes_bundle_and_reports() {
    let dir = temp_out_dir("files");
    let real_path = dir.join("real.csv");
    let synthetic_path = dir.join("synthetic.csv");
    write_table_csv(&real_path, &real()).expect("write real");
    write_table_csv(&synthetic_path, &synthetic()).expect("write synthetic");

    let options = EvaluateOptions {
        out_dir: Some(dir.join("eval")),
        ..EvaluateOptions::default()
    };
    let result = EvaluationEngine::new(options)
        .run_files(&config(), &real_path, &synthetic_path)
        .expect("evaluation");

    let bundle_path = result.bundle_path.expect("bundle path");
    let bundle: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(bundle_path).expect("read bundle")).expect("json");
    assert_eq!(bundle["real_rows"], 5);
    assert_eq!(bundle["synthetic_rows"], 4);
    let first = &bundle["entries"][0];
    assert_eq!(first["name"], "SUBJECT_ID_description");
    assert_eq!(first["outcome"]["status"], "completed");

    let markdown = fs::read_to_string(result.markdown_path.expect("markdown")).expect("read md");
    assert!(markdown.starts_with("# Synthetic Data Evaluation Report"));
    let html = fs::read_to_string(result.html_path.expect("html")).expect("read html");
    assert!(html.contains("data:image/png;base64,"));
}

#[test]
fn collision_scenario_from_two_row_tables() {
    let real = Table::from_rows(
        &["a", "b"],
        vec![
            vec![Value::Int(1), Value::text("x")],
            vec![Value::Int(2), Value::text("y")],
        ],
    )
    .expect("real");
    let synthetic = Table::from_rows(
        &["a", "b"],
        vec![
            vec![Value::Int(1), Value::text("x")],
            vec![Value::Int(3), Value::text("z")],
        ],
    )
    .expect("synthetic");
    let results = RowCollisionCheck
        .compare(&TablePair::new(real, synthetic))
        .expect("collision");
    assert_eq!(results[0].result.as_scalar(), Some(1.0));
    let same_row = results[1].result.as_table().expect("table");
    assert_eq!(same_row.row(0)[..2], [&Value::Int(1), &Value::text("x")]);
}

#[test]
fn utility_distance_of_matching_single_cells_is_zero() {
    let table = Table::from_rows(&["v"], vec![vec![Value::Int(2)]]).expect("table");
    let results = UtilityDistance
        .compare(&TablePair::new(table.clone(), table))
        .expect("utility");
    assert_eq!(results[0].result.as_scalar(), Some(0.0));
}

#[test]
fn outcome_serializes_with_status_tag() {
    let skipped = Outcome::Skipped {
        reason: DISABLED_REASON.to_string(),
    };
    let json = serde_json::to_value(&skipped).expect("serialize");
    assert_eq!(json["status"], "skipped");
    assert_eq!(json["reason"], DISABLED_REASON);
}

#[test]
fn feature_named_like_the_indicator_only_skips_propensity() {
    let rows = |values: &[(i64, i64)]| {
        Table::from_rows(
            &["id", "synthetic_data"],
            values
                .iter()
                .map(|(id, flag)| vec![Value::Int(*id), Value::Int(*flag)])
                .collect(),
        )
        .expect("table")
    };
    let config = EvaluationConfig::new(vec!["id".to_string(), "synthetic_data".to_string()]);
    let result = EvaluationEngine::default()
        .run(&config, &rows(&[(1, 0), (2, 1), (3, 1)]), &rows(&[(4, 1), (5, 0), (6, 0)]))
        .expect("evaluation");

    let propensity = result
        .bundle
        .entry("propensity_score_logistic_regression")
        .expect("propensity entry");
    assert!(propensity.skip_reason().expect("skipped").contains("synthetic_data"));
    assert!(result.bundle.scalar("pMSE").is_some());
    assert!(result.bundle.table("synthetic_data_description").is_some());
}
