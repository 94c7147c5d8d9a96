use thiserror::Error;

/// Errors emitted by generators and the generation engine.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("generator '{generator}' failed: {reason}")]
    Generator { generator: String, reason: String },
    #[error("core error: {0}")]
    Core(#[from] synthvae_core::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
