use schemars::schema::RootSchema;
use schemars::schema_for;

use crate::model::EvaluationConfig;

/// Emit the JSON Schema for the evaluation configuration file.
pub fn config_json_schema() -> RootSchema {
    schema_for!(EvaluationConfig)
}
