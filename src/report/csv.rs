//! Report CSV writing.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use polars::frame::DataFrame;
use polars::io::SerWriter;
use polars::prelude::{Column, CsvWriter};

use crate::config::ThemeDefinition;
use crate::results::{OutputTable, ThemeBucket};

use super::format::format_cell;

/// Assemble the report and write it as CSV: one row per feature ID (ascending)
/// and one column per theme. Cells keep their embedded line breaks; the writer
/// quotes them.
pub fn write_report(
    table: &OutputTable,
    themes: &[ThemeDefinition],
    id_field: &str,
    path: &Path,
) -> Result<()> {
    let ids: Vec<String> = table.feature_ids().map(|id| id.to_string()).collect();
    let mut columns = vec![Column::new(id_field.into(), ids)];

    let empty = ThemeBucket::default();
    for theme in themes {
        let cells: Vec<String> = table
            .feature_ids()
            .map(|id| {
                let bucket = table.bucket(id, &theme.theme_name).unwrap_or(&empty);
                format_cell(bucket, theme)
            })
            .collect();
        columns.push(Column::new(theme.theme_name.as_str().into(), cells));
    }

    let mut df = DataFrame::new(columns).context("Failed to assemble the report table")?;
    let file = File::create(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
    CsvWriter::new(file)
        .finish(&mut df)
        .with_context(|| format!("Failed to write CSV to {}", path.display()))
}
