use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use polars::frame::DataFrame;
use polars::io::SerReader;
use polars::prelude::CsvReadOptions;
use tracing::error;

use crate::layer::LayerCache;

use super::theme::{CheckMethod, ThemeDefinition};

const REPORTING_FIELD_COLUMNS: [&str; 4] = ["REPFLD1", "REPFLD2", "REPFLD3", "REPFLD4"];

/// Read the theme reference table and build one definition per enabled row.
/// Each enabled value layer is loaded into the cache as a side effect; a layer
/// that fails to load is logged and its theme reports Nil for the whole run.
pub fn load_reference_table(
    path: &Path,
    data_root: &Path,
    cache: &mut LayerCache,
) -> Result<Vec<ThemeDefinition>> {
    let df = read_table(path)?;

    let mut themes = Vec::new();
    let mut seen_names: HashSet<String> = HashSet::new();
    for row in 0..df.height() {
        if !cell(&df, "CHECK_YN", row)?.is_some_and(|v| v.eq_ignore_ascii_case("y")) {
            continue;
        }

        let theme_name = cell(&df, "THEMENAME", row)?
            .with_context(|| format!("reference table row {row} has no THEMENAME"))?
            .to_string();
        ensure!(
            seen_names.insert(theme_name.clone()),
            "duplicate enabled theme name '{theme_name}' in reference table"
        );

        let fc_name = cell(&df, "FC_NAME", row)?.unwrap_or_default().to_string();
        let source_path = resolve_source(
            data_root,
            cell(&df, "DEFAULTWS_YN", row)?.is_some_and(|v| v.eq_ignore_ascii_case("y")),
            cell(&df, "DATA_LOC", row)?.unwrap_or_default(),
            cell(&df, "GDB_NAME", row)?.unwrap_or_default(),
            &fc_name,
        );
        let source_key = source_path.to_string_lossy().into_owned();

        let method = CheckMethod::parse(
            cell(&df, "CHECK_METHOD", row)?
                .with_context(|| format!("theme '{theme_name}' has no CHECK_METHOD"))?,
        )
        .with_context(|| format!("theme '{theme_name}'"))?;

        let buffer_distance: f64 = match cell(&df, "BUFFER_DIST", row)? {
            None => 0.0,
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("theme '{theme_name}' has invalid BUFFER_DIST '{raw}'"))?,
        };
        ensure!(
            buffer_distance >= 0.0 && buffer_distance.is_finite(),
            "theme '{theme_name}' has negative BUFFER_DIST"
        );

        // Blank reporting fields are dropped, blank queries mean no filter.
        let mut reporting_fields = Vec::new();
        for column in REPORTING_FIELD_COLUMNS {
            if let Some(field) = cell(&df, column, row)? {
                reporting_fields.push(field.to_string());
            }
        }
        let definition_query = cell(&df, "DEF_QUERY", row)?.map(str::to_string);

        let geometry_kind = match cache.get_or_load_value(&source_key, &source_path) {
            Ok(layer) => Some(layer.kind()),
            Err(e) => {
                error!("Failed to cache values layer for theme '{theme_name}': {e:#}");
                None
            }
        };

        themes.push(ThemeDefinition {
            theme_name,
            source_path,
            source_key,
            definition_query,
            method,
            reporting_fields,
            buffer_distance,
            geometry_kind,
        });
    }
    Ok(themes)
}

fn read_table(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open reference table: {}", path.display()))?;
    // Every column is read as text; typed cells are parsed per row.
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(file)
        .finish()
        .with_context(|| format!("Failed to read reference table from {}", path.display()))
}

/// A trimmed cell value; `None` for missing or whitespace-only cells.
fn cell<'a>(df: &'a DataFrame, column: &str, row: usize) -> Result<Option<&'a str>> {
    let values = df
        .column(column)
        .with_context(|| format!("reference table is missing column '{column}'"))?
        .str()
        .with_context(|| format!("reference table column '{column}' is not text"))?;
    Ok(values.get(row).map(str::trim).filter(|v| !v.is_empty()))
}

/// Default-workspace rows live under the shared data root; everything else
/// names its source directly.
fn resolve_source(
    data_root: &Path,
    default_ws: bool,
    data_loc: &str,
    gdb_name: &str,
    fc_name: &str,
) -> PathBuf {
    if default_ws {
        data_root
            .join(data_loc)
            .join(gdb_name)
            .join(format!("{fc_name}.shp"))
    } else {
        let mut path = PathBuf::from(data_loc);
        if path.extension().is_none() {
            path.set_extension("shp");
        }
        path
    }
}
