//! Evaluation and generation configuration contract.
//!
//! The configuration fixes the feature list and column roles for a run. It is
//! checked structurally against its JSON Schema, semantically on its own, and
//! finally against the real and synthetic tables before any metric runs.

pub mod errors;
pub mod model;
pub mod schema;
pub mod validate;

pub use errors::{ConfigError, IssueSeverity, Result, ValidationIssue, ValidationReport};
pub use model::{
    CONFIG_VERSION, EvaluationConfig, EvaluationSettings, GenerationSettings, METRIC_NAMES,
};
pub use schema::config_json_schema;
pub use validate::{
    ValidatedConfig, load_config, parse_config, validate_config, validate_config_against_tables,
    validate_config_json,
};
