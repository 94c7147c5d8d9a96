use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use synthvae_core::RoleTable;

/// Configuration contract version understood by this build.
pub const CONFIG_VERSION: &str = "0.1";

/// Names accepted in `evaluation.disabled_metrics`.
///
/// The first three switch off a per-column family; the rest name a single
/// pair comparator.
pub const METRIC_NAMES: [&str; 8] = [
    "description",
    "missingness",
    "distribution",
    "voas_williams_statistic",
    "gower_analysis",
    "propensity_score_logistic_regression",
    "collision_analysis",
    "pca_evaluation",
];

/// Top-level configuration for evaluation and generation runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct EvaluationConfig {
    /// Contract version the file was written against.
    pub config_version: String,
    /// Ordered list of compared columns.
    pub all_features: Vec<String>,
    /// Subset of `all_features` treated as categorical.
    #[serde(default)]
    pub categorical_features: Vec<String>,
    /// Subset of `all_features` holding timestamps.
    #[serde(default)]
    pub time_features: Vec<String>,
    #[serde(default)]
    pub evaluation: EvaluationSettings,
    #[serde(default)]
    pub generation: GenerationSettings,
}

/// Metric engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct EvaluationSettings {
    /// Standardise each table before the PCA projection.
    #[serde(default = "default_true")]
    pub standardize_projection: bool,
    /// Iteration cap for the propensity model solver.
    #[serde(default = "default_max_iter")]
    pub propensity_max_iter: u32,
    /// Comparators to skip; see [`METRIC_NAMES`].
    #[serde(default)]
    pub disabled_metrics: Vec<String>,
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            standardize_projection: true,
            propensity_max_iter: default_max_iter(),
            disabled_metrics: Vec::new(),
        }
    }
}

/// Built-in generator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GenerationSettings {
    /// Number of synthetic rows to produce.
    #[serde(default = "default_rows")]
    pub synthetic_rows: u64,
    /// RNG seed for deterministic sampling.
    #[serde(default)]
    pub seed: u64,
    /// Identifier column written first in `synthetic.csv`.
    #[serde(default = "default_id_column")]
    pub id_column: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            synthetic_rows: default_rows(),
            seed: 0,
            id_column: default_id_column(),
        }
    }
}

impl EvaluationConfig {
    /// Minimal configuration with every other field at its default.
    pub fn new(all_features: Vec<String>) -> Self {
        Self {
            config_version: CONFIG_VERSION.to_string(),
            all_features,
            categorical_features: Vec::new(),
            time_features: Vec::new(),
            evaluation: EvaluationSettings::default(),
            generation: GenerationSettings::default(),
        }
    }

    /// Resolve the role of every configured feature once for the run.
    pub fn role_table(&self) -> RoleTable {
        RoleTable::new(
            &self.all_features,
            &self.categorical_features,
            &self.time_features,
        )
    }

    pub fn is_disabled(&self, metric: &str) -> bool {
        self.evaluation
            .disabled_metrics
            .iter()
            .any(|name| name == metric)
    }
}

fn default_true() -> bool {
    true
}

fn default_max_iter() -> u32 {
    300
}

fn default_rows() -> u64 {
    1000
}

fn default_id_column() -> String {
    "ROW_ID".to_string()
}
