mod registry;

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use registry::{RunContext, RunInputs, RunPaths, init_run_logging, start_run};
use synthvae_config::{ConfigError, ValidatedConfig, config_json_schema, load_config};
use synthvae_core::read_table_csv;
use synthvae_eval::{EvalError, EvaluateOptions, EvaluationEngine, EvaluationResult};
use synthvae_generate::{GenerateOptions, GenerationEngine, GenerationError, MarginalSampler};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
enum CliError {
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("core error: {0}")]
    Core(#[from] synthvae_core::Error),
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
    #[error("evaluation error: {0}")]
    Eval(#[from] EvalError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "synthvae", version, about = "Synthetic tabular data generation and evaluation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compare a synthetic CSV against the real CSV it imitates.
    Evaluate(EvaluateArgs),
    /// Sample a synthetic CSV from a real one.
    Generate(GenerateArgs),
    /// Generate, then evaluate the output against the real table.
    Run(RunArgs),
    /// Print the JSON Schema of the configuration file.
    Schema(SchemaArgs),
}

#[derive(Args, Debug)]
struct ReportArgs {
    /// Maximum table rows rendered into reports.
    #[arg(long, default_value_t = 20)]
    max_table_rows: usize,
    /// Skip report.md.
    #[arg(long, default_value_t = false)]
    no_markdown: bool,
    /// Skip report.html.
    #[arg(long, default_value_t = false)]
    no_html: bool,
}

#[derive(Args, Debug)]
struct EvaluateArgs {
    /// Evaluation config (TOML or JSON).
    #[arg(long)]
    config: PathBuf,
    /// Real data CSV.
    #[arg(long)]
    real: PathBuf,
    /// Synthetic data CSV.
    #[arg(long)]
    synthetic: PathBuf,
    /// Output directory for runs.
    #[arg(long, default_value = "runs")]
    run_dir: PathBuf,
    #[command(flatten)]
    report: ReportArgs,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Evaluation config (TOML or JSON).
    #[arg(long)]
    config: PathBuf,
    /// Real data CSV to sample from.
    #[arg(long)]
    real: PathBuf,
    /// Rows to generate; defaults to the config value.
    #[arg(long)]
    rows: Option<usize>,
    /// Sampler seed; defaults to the config value.
    #[arg(long)]
    seed: Option<u64>,
    /// Output directory for runs.
    #[arg(long, default_value = "runs")]
    run_dir: PathBuf,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    generate: GenerateArgs,
    #[command(flatten)]
    report: ReportArgs,
}

#[derive(Args, Debug)]
struct SchemaArgs {
    /// Write the schema to a file instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Evaluate(args) => run_evaluate(args),
        Command::Generate(args) => run_generate(args),
        Command::Run(args) => run_pipeline(args),
        Command::Schema(args) => run_schema(args),
    }
}

fn run_evaluate(args: EvaluateArgs) -> Result<(), CliError> {
    let validated = load_config(&args.config)?;
    let inputs = RunInputs {
        config: args.config.clone(),
        real: args.real.clone(),
        synthetic: Some(args.synthetic.clone()),
    };
    let run_paths = begin_run("evaluate", &args.run_dir, inputs, &validated)?;
    let timer = Instant::now();

    let result = evaluate_into(&run_paths, &validated, &args.real, &args.synthetic, &args.report)?;
    print_summary(&run_paths, &result);

    tracing::info!(
        event = "run_finished",
        status = "success",
        duration_ms = timer.elapsed().as_millis() as u64
    );
    Ok(())
}

fn run_generate(args: GenerateArgs) -> Result<(), CliError> {
    let validated = load_config(&args.config)?;
    let inputs = RunInputs {
        config: args.config.clone(),
        real: args.real.clone(),
        synthetic: None,
    };
    let run_paths = begin_run("generate", &args.run_dir, inputs, &validated)?;
    let timer = Instant::now();

    let synthetic_path = generate_into(&run_paths, &validated, &args)?;
    println!("synthetic={}", synthetic_path.display());

    tracing::info!(
        event = "run_finished",
        status = "success",
        duration_ms = timer.elapsed().as_millis() as u64
    );
    Ok(())
}

fn run_pipeline(args: RunArgs) -> Result<(), CliError> {
    let RunArgs { generate, report } = args;
    let validated = load_config(&generate.config)?;
    let inputs = RunInputs {
        config: generate.config.clone(),
        real: generate.real.clone(),
        synthetic: None,
    };
    let run_paths = begin_run("run", &generate.run_dir, inputs, &validated)?;
    let timer = Instant::now();

    let synthetic_path = generate_into(&run_paths, &validated, &generate)?;
    let result = evaluate_into(&run_paths, &validated, &generate.real, &synthetic_path, &report)?;
    println!("synthetic={}", synthetic_path.display());
    print_summary(&run_paths, &result);

    tracing::info!(
        event = "run_finished",
        status = "success",
        duration_ms = timer.elapsed().as_millis() as u64
    );
    Ok(())
}

fn run_schema(args: SchemaArgs) -> Result<(), CliError> {
    let schema = serde_json::to_string_pretty(&config_json_schema())?;
    match args.out {
        Some(path) => std::fs::write(path, schema)?,
        None => println!("{schema}"),
    }
    Ok(())
}

fn begin_run(
    command: &str,
    run_dir: &Path,
    inputs: RunInputs,
    validated: &ValidatedConfig,
) -> Result<RunPaths, CliError> {
    let run_id = Uuid::new_v4().to_string();
    let run_ctx = RunContext {
        run_id: run_id.clone(),
        started_at: chrono::Utc::now(),
        command: command.to_string(),
        run_dir: run_dir.to_path_buf(),
        inputs,
        config: validated.config.clone(),
    };

    let run_paths = start_run(&run_ctx)?;
    init_run_logging(&run_paths.logs_path)?;

    tracing::info!(
        event = "run_started",
        run_id = %run_id,
        command = command,
        config = %run_paths.config_path.display()
    );
    for warning in &validated.warnings {
        tracing::warn!(event = "config_warning", code = %warning.code, path = %warning.path, message = %warning.message);
    }
    Ok(run_paths)
}

fn generate_into(
    run_paths: &RunPaths,
    validated: &ValidatedConfig,
    args: &GenerateArgs,
) -> Result<PathBuf, CliError> {
    let config = &validated.config;
    let mut options = GenerateOptions::from_config(run_paths.root.clone(), config);
    if let Some(rows) = args.rows {
        options.rows = rows;
    }
    if let Some(seed) = args.seed {
        options.seed = seed;
    }

    let roles = config.role_table();
    let real = read_table_csv(&args.real, &roles)?;
    tracing::info!(event = "real_loaded", path = %args.real.display(), rows = real.row_count());

    let sampler = MarginalSampler::new(options.seed);
    let result = GenerationEngine::new(options).run(&sampler, &real, &roles)?;
    tracing::info!(
        event = "synthetic_written",
        path = %result.synthetic_path.display(),
        rows = result.report.rows_generated
    );
    Ok(result.synthetic_path)
}

fn evaluate_into(
    run_paths: &RunPaths,
    validated: &ValidatedConfig,
    real: &Path,
    synthetic: &Path,
    report: &ReportArgs,
) -> Result<EvaluationResult, CliError> {
    let options = EvaluateOptions {
        out_dir: Some(run_paths.root.clone()),
        write_markdown: !report.no_markdown,
        write_html: !report.no_html,
        max_table_rows: report.max_table_rows,
    };
    let result = EvaluationEngine::new(options).run_files(&validated.config, real, synthetic)?;
    if let Some(path) = &result.bundle_path {
        tracing::info!(event = "bundle_written", path = %path.display());
    }
    Ok(result)
}

fn print_summary(run_paths: &RunPaths, result: &EvaluationResult) {
    for name in result.bundle.metric_names() {
        if let Some(value) = result.bundle.scalar(name) {
            println!("{name}={value:.6}");
        }
    }
    let skipped = result.bundle.skipped().count();
    if skipped > 0 {
        println!("skipped={skipped}");
    }
    println!("run={}", run_paths.root.display());
}
