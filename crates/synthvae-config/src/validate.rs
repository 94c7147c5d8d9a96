use std::collections::HashSet;
use std::fs;
use std::path::Path;

use jsonschema::JSONSchema;
use serde_json::Value as JsonValue;
use synthvae_core::{ColumnRole, SOURCE_COLUMN, Table, TableSide};

use crate::errors::{ConfigError, ValidationIssue, ValidationReport};
use crate::model::{CONFIG_VERSION, EvaluationConfig, METRIC_NAMES};
use crate::schema::config_json_schema;

/// Parsed configuration with accumulated warnings.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub config: EvaluationConfig,
    pub warnings: Vec<ValidationIssue>,
}

/// Validate a configuration JSON document against the configuration JSON Schema.
pub fn validate_config_json(
    config_json: &JsonValue,
    config_schema: &JsonValue,
) -> Result<ValidationReport, ConfigError> {
    let compiled =
        JSONSchema::compile(config_schema).map_err(|err| ConfigError::Schema(err.to_string()))?;

    let mut report = ValidationReport::default();

    if let Err(errors) = compiled.validate(config_json) {
        for error in errors {
            let path = normalized_json_pointer(&error.instance_path.to_string());
            report.push_error(ValidationIssue::error(
                "schema_violation",
                path,
                error.to_string(),
                None,
            ));
        }
    }

    Ok(report)
}

/// Semantic checks that need no data.
pub fn validate_config(config: &EvaluationConfig) -> ValidationReport {
    let mut report = ValidationReport::default();

    if config.config_version != CONFIG_VERSION {
        report.push_warning(ValidationIssue::warning(
            "config_version_mismatch",
            "/config_version",
            format!(
                "config_version '{}' differs from supported version '{}'",
                config.config_version, CONFIG_VERSION
            ),
            Some(format!("set config_version = \"{CONFIG_VERSION}\"")),
        ));
    }

    validate_features(config, &mut report);
    validate_role_lists(config, &mut report);
    validate_settings(config, &mut report);

    report
}

fn validate_features(config: &EvaluationConfig, report: &mut ValidationReport) {
    if config.all_features.is_empty() {
        report.push_error(ValidationIssue::error(
            "features_empty",
            "/all_features",
            "all_features must list at least one column",
            Some("add the columns shared by the real and synthetic tables".to_string()),
        ));
        return;
    }

    let mut seen = HashSet::new();
    for (idx, feature) in config.all_features.iter().enumerate() {
        if !seen.insert(feature.as_str()) {
            report.push_error(ValidationIssue::error(
                "duplicate_feature",
                format!("/all_features/{idx}"),
                format!("feature '{feature}' is listed more than once"),
                None,
            ));
        }
        if feature == SOURCE_COLUMN {
            let path = format!("/all_features/{idx}");
            let message = format!("feature '{feature}' shares the name of the source indicator column");
            let hint = Some("rename the column in both tables".to_string());
            if config.categorical_features.is_empty() && config.time_features.is_empty() {
                // Only propensity scoring stacks the tables; it will be skipped.
                report.push_warning(ValidationIssue::warning("reserved_column", path, message, hint));
            } else {
                report.push_error(ValidationIssue::error("reserved_column", path, message, hint));
            }
        }
    }
}

fn validate_role_lists(config: &EvaluationConfig, report: &mut ValidationReport) {
    let known: HashSet<&str> = config.all_features.iter().map(String::as_str).collect();

    for (idx, feature) in config.categorical_features.iter().enumerate() {
        if !known.contains(feature.as_str()) {
            report.push_error(ValidationIssue::error(
                "unknown_categorical_feature",
                format!("/categorical_features/{idx}"),
                format!("categorical feature '{feature}' is not in all_features"),
                Some("add it to all_features or remove it here".to_string()),
            ));
        }
    }

    for (idx, feature) in config.time_features.iter().enumerate() {
        if !known.contains(feature.as_str()) {
            report.push_error(ValidationIssue::error(
                "unknown_time_feature",
                format!("/time_features/{idx}"),
                format!("time feature '{feature}' is not in all_features"),
                Some("add it to all_features or remove it here".to_string()),
            ));
        }
        if config.categorical_features.contains(feature) {
            report.push_error(ValidationIssue::error(
                "role_conflict",
                format!("/time_features/{idx}"),
                format!("feature '{feature}' is both categorical and temporal"),
                Some("a column has exactly one role".to_string()),
            ));
        }
    }
}

fn validate_settings(config: &EvaluationConfig, report: &mut ValidationReport) {
    if config.generation.synthetic_rows == 0 {
        report.push_error(ValidationIssue::error(
            "rows_zero",
            "/generation/synthetic_rows",
            "synthetic_rows must be greater than zero",
            Some("set synthetic_rows to a positive integer".to_string()),
        ));
    }

    if config.evaluation.propensity_max_iter == 0 {
        report.push_error(ValidationIssue::error(
            "propensity_max_iter_zero",
            "/evaluation/propensity_max_iter",
            "propensity_max_iter must be greater than zero",
            None,
        ));
    }

    for (idx, metric) in config.evaluation.disabled_metrics.iter().enumerate() {
        if !METRIC_NAMES.contains(&metric.as_str()) {
            report.push_error(ValidationIssue::error(
                "unknown_disabled_metric",
                format!("/evaluation/disabled_metrics/{idx}"),
                format!("unknown metric '{metric}'"),
                Some(format!("expected one of: {}", METRIC_NAMES.join(", "))),
            ));
        }
    }
}

/// Check the configuration against the loaded tables.
///
/// Every feature must exist on both sides, and continuous features may only
/// hold numeric or missing cells.
pub fn validate_config_against_tables(
    config: &EvaluationConfig,
    real: &Table,
    synthetic: &Table,
) -> ValidationReport {
    let mut report = ValidationReport::default();
    let roles = config.role_table();

    for (idx, (feature, role)) in roles.iter().enumerate() {
        let path = format!("/all_features/{idx}");
        for (side, table) in [(TableSide::Real, real), (TableSide::Synthetic, synthetic)] {
            let Some(column) = table.column(feature) else {
                report.push_error(ValidationIssue::error(
                    "missing_feature",
                    path.clone(),
                    format!("feature '{feature}' not found in {side} table"),
                    None,
                ));
                continue;
            };
            if role != ColumnRole::Continuous {
                continue;
            }
            if let Some((row, value)) = column.first_non_numeric() {
                report.push_error(ValidationIssue::error(
                    "non_numeric_continuous",
                    path.clone(),
                    format!(
                        "continuous feature '{feature}' holds non-numeric value '{value}' at row {row} of the {side} table"
                    ),
                    Some("list the column in categorical_features or time_features".to_string()),
                ));
            }
        }
    }

    report
}

/// Validate a configuration document end-to-end.
pub fn parse_config(config_json: &JsonValue) -> Result<ValidatedConfig, ConfigError> {
    let schema = serde_json::to_value(config_json_schema())?;
    let structural = validate_config_json(config_json, &schema)?;
    if !structural.is_ok() {
        return Err(ConfigError::Invalid(structural));
    }

    let config: EvaluationConfig = serde_json::from_value(config_json.clone())?;
    let semantic = validate_config(&config);
    if !semantic.is_ok() {
        return Err(ConfigError::Invalid(semantic));
    }

    Ok(ValidatedConfig {
        config,
        warnings: semantic.warnings,
    })
}

/// Load a `.toml` or `.json` configuration file and validate it.
pub fn load_config(path: &Path) -> Result<ValidatedConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    let document: JsonValue = if is_toml {
        toml::from_str(&contents)?
    } else {
        serde_json::from_str(&contents)?
    };

    parse_config(&document)
}

fn normalized_json_pointer(pointer: &str) -> String {
    if pointer.is_empty() {
        "/".to_string()
    } else {
        pointer.to_string()
    }
}
