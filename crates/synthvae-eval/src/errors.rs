use synthvae_config::ConfigError;
use synthvae_core::GraphError;
use thiserror::Error;

/// Errors emitted by the aligner, comparators and evaluation engine.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("{0}")]
    Core(#[from] synthvae_core::Error),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("render error: {0}")]
    Render(String),
    #[error("metric '{metric}' failed: {reason}")]
    Metric { metric: String, reason: String },
    #[error("duplicate metric name: {0}")]
    DuplicateMetric(String),
    #[error("stage graph error: {0}")]
    Graph(#[from] GraphError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EvalError {
    pub(crate) fn metric(metric: &str, reason: impl Into<String>) -> Self {
        EvalError::Metric {
            metric: metric.to_string(),
            reason: reason.into(),
        }
    }
}
