use std::env;
use std::path::PathBuf;

use synthvae_config::load_config;
use synthvae_eval::{EvaluateOptions, EvaluationEngine};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let mut config_path: Option<PathBuf> = None;
    let mut real_path: Option<PathBuf> = None;
    let mut synthetic_path: Option<PathBuf> = None;
    let mut out_dir: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config_path = args.next().map(PathBuf::from),
            "--real" => real_path = args.next().map(PathBuf::from),
            "--synthetic" => synthetic_path = args.next().map(PathBuf::from),
            "--out" => out_dir = args.next().map(PathBuf::from),
            _ => return Err(format!("unexpected argument '{arg}'").into()),
        }
    }

    let config_path = config_path.ok_or("missing --config path")?;
    let real_path = real_path.ok_or("missing --real path")?;
    let synthetic_path = synthetic_path.ok_or("missing --synthetic path")?;

    let validated = load_config(&config_path)?;
    let options = EvaluateOptions {
        out_dir,
        ..EvaluateOptions::default()
    };
    let result = EvaluationEngine::new(options).run_files(
        &validated.config,
        &real_path,
        &synthetic_path,
    )?;

    for name in result.bundle.metric_names() {
        if let Some(value) = result.bundle.scalar(name) {
            println!("{name}={value}");
        }
    }
    if let Some(path) = result.bundle_path {
        println!("bundle_path={}", path.display());
    }
    Ok(())
}
