//! Stage graph of an evaluation run.
//!
//! Stages read and write [`Artifact`] slots holding aligned table pairs. The
//! wiring is declared once in [`stage_specs`] and checked when the graph is
//! built, so a miswired pipeline fails before any table is touched.

use std::collections::BTreeMap;
use std::fmt;

use synthvae_core::{GraphError, StageGraph, StageSpec};

use crate::align::TablePair;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    SelectColumns,
    EncodeTemporal,
    FeatureComparison,
    FillMissing,
    EncodeCategorical,
    UtilityDistance,
    MixedDistance,
    Discriminability,
    RowCollision,
    Projection,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::SelectColumns => "select_columns",
            Stage::EncodeTemporal => "encode_temporal",
            Stage::FeatureComparison => "feature_comparison",
            Stage::FillMissing => "fill_missing",
            Stage::EncodeCategorical => "encode_categorical",
            Stage::UtilityDistance => "utility_distance",
            Stage::MixedDistance => "mixed_distance",
            Stage::Discriminability => "discriminability",
            Stage::RowCollision => "row_collision",
            Stage::Projection => "projection",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Table pairs passed between stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Artifact {
    /// The caller's tables, untouched.
    RawPair,
    SelectedPair,
    TemporalPair,
    FilledPair,
    EncodedPair,
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Artifact::RawPair => "raw_pair",
            Artifact::SelectedPair => "selected_pair",
            Artifact::TemporalPair => "temporal_pair",
            Artifact::FilledPair => "filled_pair",
            Artifact::EncodedPair => "encoded_pair",
        };
        f.write_str(name)
    }
}

pub type EvaluationGraph = StageGraph<Stage, Artifact>;

pub fn stage_specs() -> Vec<StageSpec<Stage, Artifact>> {
    use Artifact::*;

    let encoded = |stage| StageSpec::new(stage, vec![EncodedPair], Vec::new());
    vec![
        StageSpec::new(Stage::SelectColumns, vec![RawPair], vec![SelectedPair]),
        StageSpec::new(Stage::EncodeTemporal, vec![SelectedPair], vec![TemporalPair]),
        StageSpec::new(Stage::FeatureComparison, vec![TemporalPair], Vec::new()),
        StageSpec::new(Stage::FillMissing, vec![TemporalPair], vec![FilledPair]),
        StageSpec::new(Stage::EncodeCategorical, vec![FilledPair], vec![EncodedPair]),
        encoded(Stage::UtilityDistance),
        encoded(Stage::MixedDistance),
        encoded(Stage::Discriminability),
        encoded(Stage::RowCollision),
        encoded(Stage::Projection),
    ]
}

pub fn evaluation_graph() -> Result<EvaluationGraph, GraphError> {
    StageGraph::build(&[Artifact::RawPair], stage_specs())
}

/// Artifact slots filled while walking the graph.
#[derive(Debug, Default)]
pub struct PairStore {
    pairs: BTreeMap<Artifact, TablePair>,
}

impl PairStore {
    pub fn insert(&mut self, artifact: Artifact, pair: TablePair) {
        self.pairs.insert(artifact, pair);
    }

    pub fn get(&self, stage: Stage, artifact: Artifact) -> Result<&TablePair, GraphError> {
        self.pairs
            .get(&artifact)
            .ok_or_else(|| GraphError::MissingProducer {
                stage: stage.to_string(),
                artifact: artifact.to_string(),
            })
    }
}
