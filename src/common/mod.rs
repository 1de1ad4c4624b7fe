use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;

/// Create the directory if it doesn’t exist; error if a non-directory exists there.
pub fn ensure_dir_exists(path: &Path) -> Result<()> {
    if path.exists() {
        if !path.is_dir() {
            anyhow::bail!("Path exists but is not a directory: {}", path.display());
        }
    } else {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory {}", path.display()))?;
    }
    Ok(())
}

/// Error unless the directory already exists.
pub fn require_dir_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("Directory does not exist: {}", path.display());
    }
    if !path.is_dir() {
        anyhow::bail!("Path exists but is not a directory: {}", path.display());
    }
    Ok(())
}

/// Error unless the file already exists.
pub fn require_file_exists(path: &Path) -> Result<()> {
    if !path.is_file() {
        anyhow::bail!("File does not exist: {}", path.display());
    }
    Ok(())
}

/// Timestamp prefix shared by the run's artifacts, e.g. `20250804_1412hr`.
pub fn run_timestamp() -> String {
    Local::now().format("%Y%m%d_%H%Mhr").to_string()
}

/// File stem of a path (`works.shp` -> `works`).
pub fn basename(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
