use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::prelude::*;

use super::{RegistryError, RegistryResult};

const DEFAULT_DIRECTIVE: &str = "info";

/// Install the process-wide subscriber that appends one JSON object per
/// event to the run's `logs.ndjson`.
///
/// `RUST_LOG` overrides the default `info` directive. Fails if a subscriber
/// is already installed.
pub fn init_run_logging(path: &Path) -> RegistryResult<()> {
    let log_file = open_log(path)?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    let json_events = tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(false)
        .with_timer(UtcTime::rfc_3339())
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(filter)
        .with(json_events)
        .try_init()
        .map_err(|err| RegistryError::Logging(format!("{}: {err}", path.display())))
}

fn open_log(path: &Path) -> RegistryResult<File> {
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}
