//! Run log setup: stderr progress plus an append-only log file in the output directory.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::common::{ensure_dir_exists, run_timestamp};

/// Install the global subscriber. The returned guard must stay alive for the
/// whole run so buffered log lines reach the file on every exit path.
pub fn init(out_dir: &Path, verbose: u8) -> Result<WorkerGuard> {
    ensure_dir_exists(out_dir)?;
    let log_path = out_dir.join(format!("{}_valuecheck.log", run_timestamp()));
    let file = File::create(&log_path)
        .with_context(|| format!("Failed to create log file: {}", log_path.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(fmt::layer().with_target(false).with_ansi(false).with_writer(writer))
        .init();

    Ok(guard)
}
