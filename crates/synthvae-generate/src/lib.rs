//! Synthetic table generation for synthvae.
//!
//! Model-backed generators plug in through [`SyntheticGenerator`]; the crate
//! ships a seeded [`MarginalSampler`] and a [`GenerationEngine`] that writes
//! `synthetic.csv` plus a `generation_report.json` for a run.

pub mod engine;
pub mod errors;
pub mod generator;
pub mod model;
pub mod sampler;

pub use engine::{GenerationEngine, GenerationResult};
pub use errors::GenerationError;
pub use generator::SyntheticGenerator;
pub use model::{ColumnReport, GenerateOptions, GenerationReport};
pub use sampler::MarginalSampler;
