//! Pipeline orchestration: load config, cache layers and buffers, intersect
//! every theme against every subject feature, format, write the CSV.

use std::path::PathBuf;

use anyhow::{Context, Result, ensure};
use tracing::{error, info, warn};

use crate::cli::Cli;
use crate::common;
use crate::config::{self, ThemeDefinition};
use crate::engine;
use crate::layer::{self, FeatureId, Layer, LayerCache};
use crate::report;
use crate::results::{Location, OutputTable};

/// Run the whole values check. Returns the path of the written report.
pub fn execute(args: &Cli) -> Result<PathBuf> {
    validate(args)?;
    let stamp = common::run_timestamp();
    let base_name = common::basename(&args.input);
    info!("Starting values checking for {base_name}");

    // Subject layer and its feature identifiers.
    let subject = Layer::from_shapefile(&base_name, &args.input)
        .with_context(|| format!("Failed to load input dataset: {}", args.input.display()))?;
    let subject_ids = layer::feature_ids(&subject, &args.id_field)
        .context("Input dataset is missing usable feature identifiers")?;
    let mut cache = LayerCache::new(subject);

    // Reference table; enabled value layers are cached as a side effect.
    info!("Caching values layers, please be patient...");
    let themes = config::load_reference_table(&args.ref_table, &args.data_root, &mut cache)?;
    ensure!(
        !themes.is_empty(),
        "reference table {} has no enabled themes",
        args.ref_table.display()
    );
    info!("Cached {} values layers", themes.len());

    // Buffer zones, one per distinct distance. A buffer that cannot be built
    // poisons every theme at that distance, so failure here is fatal.
    info!("Caching works and buffers, please be patient...");
    let mut distances: Vec<f64> = themes
        .iter()
        .map(|theme| theme.buffer_distance)
        .filter(|d| *d > 0.0)
        .collect();
    distances.sort_by(f64::total_cmp);
    distances.dedup();
    for &distance in &distances {
        cache
            .get_or_build_buffer(distance)
            .with_context(|| format!("Failed to build {distance}m buffer around {base_name}"))?;
    }
    info!("Cached {base_name} and {} buffers", distances.len());

    // Every (feature, theme) pair starts out present and empty.
    let theme_names: Vec<String> = themes.iter().map(|t| t.theme_name.clone()).collect();
    let mut table = OutputTable::init(subject_ids.iter().cloned(), &theme_names);
    info!("Created empty output table for {} features", table.len());

    info!(" - - - - -");
    info!("Intersecting {} values layers", themes.len());
    for (index, theme) in themes.iter().enumerate() {
        process_theme(&cache, &subject_ids, theme, &mut table, index + 1, themes.len());
    }

    let csv_path = args
        .out_dir
        .join(format!("{stamp}_{base_name}_ValuesCheck.csv"));
    report::write_report(&table, &themes, &args.id_field, &csv_path)?;
    info!("Results written to CSV: {}", csv_path.display());
    info!("Script completed. Total values layers processed: {}", themes.len());
    Ok(csv_path)
}

/// Run one theme against the base subject layer and, when configured, against
/// the matching buffer layer. Engine failures darken this theme only.
fn process_theme(
    cache: &LayerCache,
    subject_ids: &[FeatureId],
    theme: &ThemeDefinition,
    table: &mut OutputTable,
    index: usize,
    total: usize,
) {
    let Some(values) = cache.value(&theme.source_key) else {
        warn!(
            "{index}/{total} Values layer unavailable for theme '{}', reporting Nil",
            theme.theme_name
        );
        return;
    };

    run_pass(
        cache.subject(),
        subject_ids,
        theme,
        values,
        Location::InPolygon,
        table,
        index,
        total,
        "works polygons",
    );

    if theme.buffer_distance > 0.0 {
        let label = format!("{}m works buffer", theme.buffer_distance);
        match cache.buffer(theme.buffer_distance) {
            Some(buffered) => run_pass(
                buffered,
                subject_ids,
                theme,
                values,
                Location::InBuffer,
                table,
                index,
                total,
                &label,
            ),
            None => error!(
                "{index}/{total} Missing cached {label} for theme '{}'",
                theme.theme_name
            ),
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_pass(
    subject: &Layer,
    subject_ids: &[FeatureId],
    theme: &ThemeDefinition,
    values: &Layer,
    location: Location,
    table: &mut OutputTable,
    index: usize,
    total: usize,
    label: &str,
) {
    match engine::intersect_layer(subject, subject_ids, theme, values, location, table) {
        Ok(stats) if stats.pairs == 0 => info!(
            "{index}/{total} No intersections found between {} and {label} ({})",
            values.name(),
            theme.method
        ),
        Ok(stats) => info!(
            "{index}/{total} Processed {} intersections between {} and {label} ({})",
            stats.pairs,
            values.name(),
            theme.method
        ),
        Err(e) => error!(
            "{index}/{total} Error intersecting {} with {label}: {e:#}",
            values.name()
        ),
    }
}

/// Check every input path before any processing starts.
fn validate(args: &Cli) -> Result<()> {
    common::require_file_exists(&args.input)
        .context("Input feature dataset does not exist")?;
    common::require_file_exists(&args.ref_table)
        .context("Reference table does not exist")?;
    common::require_dir_exists(&args.data_root)
        .context("Data root location does not exist")?;
    common::ensure_dir_exists(&args.out_dir)?;
    Ok(())
}
