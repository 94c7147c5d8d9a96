use std::path::Path;
use std::time::Instant;

use synthvae_config::{
    ConfigError, EvaluationConfig, validate_config, validate_config_against_tables,
};
use synthvae_core::{ColumnRole, RoleTable, Table, read_table_csv};
use tracing::{info, warn};
use uuid::Uuid;

use crate::align::{TablePair, encode_categorical, encode_temporal, fill_missing, select_columns};
use crate::errors::EvalError;
use crate::metrics::{
    ColumnComparator, DescriptiveComparison, DiscriminabilityScore, DistributionComparison,
    MissingnessComparison, MixedDistanceSummary, PairComparator, ProjectionComparison,
    RowCollisionCheck, UtilityDistance,
};
use crate::model::{
    ComparatorEntry, DISABLED_REASON, EvaluateOptions, EvaluationBundle, EvaluationResult,
    NamedResult, Outcome, PerformanceMetrics,
};
use crate::pipeline::{Artifact, PairStore, Stage, evaluation_graph};
use crate::report::{render_html, render_markdown};

/// Compare a synthetic table against the real table it imitates.
#[derive(Debug, Clone, Default)]
pub struct EvaluationEngine {
    options: EvaluateOptions,
}

impl EvaluationEngine {
    pub fn new(options: EvaluateOptions) -> Self {
        Self { options }
    }

    /// Load both CSV files with the configured roles and evaluate them.
    pub fn run_files(
        &self,
        config: &EvaluationConfig,
        real_path: &Path,
        synthetic_path: &Path,
    ) -> Result<EvaluationResult, EvalError> {
        let load_start = Instant::now();
        let roles = config.role_table();
        let real = read_table_csv(real_path, &roles)?;
        let synthetic = read_table_csv(synthetic_path, &roles)?;
        let load_ms = load_start.elapsed().as_millis();
        info!(
            real = %real_path.display(),
            synthetic = %synthetic_path.display(),
            real_rows = real.row_count(),
            synthetic_rows = synthetic.row_count(),
            load_ms = load_ms as u64,
            "tables loaded"
        );
        self.evaluate(config, &real, &synthetic, load_ms)
    }

    /// Evaluate in-memory tables. The inputs are never modified.
    ///
    /// Configuration problems found against the tables, including a feature
    /// absent from either side, are reported as
    /// [`EvalError::Config`] carrying [`ConfigError::Invalid`]; each issue
    /// (code `missing_feature` for an absent column) names the column and the
    /// table side.
    pub fn run(
        &self,
        config: &EvaluationConfig,
        real: &Table,
        synthetic: &Table,
    ) -> Result<EvaluationResult, EvalError> {
        self.evaluate(config, real, synthetic, 0)
    }

    fn evaluate(
        &self,
        config: &EvaluationConfig,
        real: &Table,
        synthetic: &Table,
        load_ms: u128,
    ) -> Result<EvaluationResult, EvalError> {
        let total_start = Instant::now();

        let mut report = validate_config(config);
        report.merge(validate_config_against_tables(config, real, synthetic));
        if !report.is_ok() {
            return Err(ConfigError::Invalid(report).into());
        }
        for warning in &report.warnings {
            warn!(code = %warning.code, path = %warning.path, "{}", warning.message);
        }

        let run_id = Uuid::new_v4().to_string();
        let roles = config.role_table();
        let graph = evaluation_graph()?;
        info!(
            run_id = %run_id,
            stages = graph.len(),
            features = roles.len(),
            "evaluation started"
        );

        let mut run = Run {
            config,
            roles: &roles,
            run_id: &run_id,
            store: PairStore::default(),
            bundle: EvaluationBundle::new(run_id.clone(), real.row_count(), synthetic.row_count()),
            align_ms: 0,
            metrics_ms: 0,
        };
        run.store
            .insert(Artifact::RawPair, TablePair::new(real.clone(), synthetic.clone()));

        for stage in graph.order() {
            run.stage(*stage)?;
        }

        let Run {
            bundle,
            align_ms,
            metrics_ms,
            ..
        } = run;
        let performance = PerformanceMetrics {
            load_ms,
            align_ms,
            metrics_ms,
            total_ms: load_ms + total_start.elapsed().as_millis(),
        };
        let report_markdown = render_markdown(&bundle, &performance, self.options.max_table_rows);

        let mut result = EvaluationResult {
            bundle,
            performance,
            report_markdown,
            bundle_path: None,
            markdown_path: None,
            html_path: None,
        };
        if let Some(out_dir) = &self.options.out_dir {
            std::fs::create_dir_all(out_dir)?;

            let bundle_path = out_dir.join("bundle.json");
            std::fs::write(&bundle_path, serde_json::to_vec_pretty(&result.bundle)?)?;
            result.bundle_path = Some(bundle_path);

            if self.options.write_markdown {
                let path = out_dir.join("report.md");
                std::fs::write(&path, result.report_markdown.as_bytes())?;
                result.markdown_path = Some(path);
            }
            if self.options.write_html {
                let path = out_dir.join("report.html");
                let html = render_html(&result.bundle, self.options.max_table_rows);
                std::fs::write(&path, html.as_bytes())?;
                result.html_path = Some(path);
            }
        }

        info!(
            run_id = %run_id,
            entries = result.bundle.entries.len(),
            skipped = result.bundle.skipped().count(),
            total_ms = result.performance.total_ms as u64,
            "evaluation finished"
        );
        Ok(result)
    }
}

/// Mutable state of one walk through the stage graph.
struct Run<'a> {
    config: &'a EvaluationConfig,
    roles: &'a RoleTable,
    run_id: &'a str,
    store: PairStore,
    bundle: EvaluationBundle,
    align_ms: u128,
    metrics_ms: u128,
}

impl Run<'_> {
    fn stage(&mut self, stage: Stage) -> Result<(), EvalError> {
        let started = Instant::now();
        let config = self.config;
        let roles = self.roles;
        match stage {
            Stage::SelectColumns => {
                let raw = self.store.get(stage, Artifact::RawPair)?;
                let selected = select_columns(&raw.real, &raw.synthetic, &config.all_features)?;
                self.store.insert(Artifact::SelectedPair, selected);
            }
            Stage::EncodeTemporal => {
                let selected = self.store.get(stage, Artifact::SelectedPair)?;
                let temporal = roles.columns_with_role(ColumnRole::Temporal);
                let encoded = encode_temporal(selected, &temporal)?;
                self.store.insert(Artifact::TemporalPair, encoded);
            }
            Stage::FeatureComparison => {
                let comparators: [&dyn ColumnComparator; 3] = [
                    &DescriptiveComparison,
                    &MissingnessComparison,
                    &DistributionComparison,
                ];
                for (column, role) in roles.iter() {
                    for comparator in comparators {
                        let entry = self.column_entry(comparator, column, role)?;
                        self.bundle.push(entry)?;
                    }
                }
            }
            Stage::FillMissing => {
                let temporal = self.store.get(stage, Artifact::TemporalPair)?;
                let filled = fill_missing(temporal);
                self.store.insert(Artifact::FilledPair, filled);
            }
            Stage::EncodeCategorical => {
                let filled = self.store.get(stage, Artifact::FilledPair)?;
                let categorical = roles.columns_with_role(ColumnRole::Categorical);
                let encoded = encode_categorical(filled, &categorical)?;
                self.store.insert(Artifact::EncodedPair, encoded);
            }
            Stage::UtilityDistance => self.pair_entry(stage, &UtilityDistance)?,
            Stage::MixedDistance => self.pair_entry(stage, &MixedDistanceSummary)?,
            Stage::Discriminability => self.pair_entry(
                stage,
                &DiscriminabilityScore::new(config.evaluation.propensity_max_iter as usize),
            )?,
            Stage::RowCollision => self.pair_entry(stage, &RowCollisionCheck)?,
            Stage::Projection => self.pair_entry(
                stage,
                &ProjectionComparison::new(config.evaluation.standardize_projection),
            )?,
        }

        let elapsed = started.elapsed().as_millis();
        match stage {
            Stage::SelectColumns
            | Stage::EncodeTemporal
            | Stage::FillMissing
            | Stage::EncodeCategorical => self.align_ms += elapsed,
            _ => self.metrics_ms += elapsed,
        }
        Ok(())
    }

    fn column_entry(
        &self,
        comparator: &dyn ColumnComparator,
        column: &str,
        role: ColumnRole,
    ) -> Result<ComparatorEntry, EvalError> {
        let name = comparator.metric_name(column);
        let started = Instant::now();
        let outcome = if self.config.is_disabled(comparator.kind()) {
            Outcome::Skipped {
                reason: DISABLED_REASON.to_string(),
            }
        } else {
            let pair = self.store.get(Stage::FeatureComparison, Artifact::TemporalPair)?;
            match comparator.compare(pair, column, role) {
                Ok(result) => Outcome::Completed {
                    results: vec![NamedResult::new(name.clone(), result)],
                },
                Err(err) => {
                    warn!(
                        run_id = %self.run_id,
                        comparator = comparator.kind(),
                        column,
                        error = %err,
                        "column comparator skipped"
                    );
                    Outcome::Skipped {
                        reason: err.to_string(),
                    }
                }
            }
        };

        Ok(ComparatorEntry {
            name,
            comparator: comparator.kind().to_string(),
            column: Some(column.to_string()),
            duration_ms: started.elapsed().as_millis() as u64,
            outcome,
        })
    }

    fn pair_entry(&mut self, stage: Stage, comparator: &dyn PairComparator) -> Result<(), EvalError> {
        let name = comparator.name();
        let started = Instant::now();
        let outcome = if self.config.is_disabled(name) {
            Outcome::Skipped {
                reason: DISABLED_REASON.to_string(),
            }
        } else {
            let pair = self.store.get(stage, Artifact::EncodedPair)?;
            match comparator.compare(pair) {
                Ok(results) => Outcome::Completed { results },
                Err(err) => {
                    warn!(
                        run_id = %self.run_id,
                        comparator = name,
                        error = %err,
                        "pair comparator skipped"
                    );
                    Outcome::Skipped {
                        reason: err.to_string(),
                    }
                }
            }
        };
        let duration_ms = started.elapsed().as_millis() as u64;
        info!(
            run_id = %self.run_id,
            comparator = name,
            duration_ms,
            "comparator finished"
        );

        self.bundle.push(ComparatorEntry {
            name: name.to_string(),
            comparator: name.to_string(),
            column: None,
            duration_ms,
            outcome,
        })
    }
}
