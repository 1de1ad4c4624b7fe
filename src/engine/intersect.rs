use anyhow::{Context, Result, bail};
use rstar::AABB;

use crate::config::{CheckMethod, ThemeDefinition};
use crate::geom::GeometryKind;
use crate::layer::{FeatureId, Layer};
use crate::query;
use crate::results::{Location, OutputTable, merge_count, merge_measure, merge_presence};

use super::clean::clean_attrs;

/// Outcome counters for one layer/location pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntersectStats {
    /// Joined (subject, value) pairs that passed the spatial predicate.
    pub pairs: usize,
}

/// Run one value layer against the full subject layer and merge every joined
/// pair into the output table. Called once per (theme, location) pair; cost is
/// proportional to the number of intersecting pairs, not features × layers.
pub fn intersect_layer(
    subject: &Layer,
    subject_ids: &[FeatureId],
    theme: &ThemeDefinition,
    values: &Layer,
    location: Location,
    table: &mut OutputTable,
) -> Result<IntersectStats> {
    let mut stats = IntersectStats::default();
    if values.is_empty() || subject.is_empty() {
        return Ok(stats);
    }

    if theme.method == CheckMethod::Measure && values.kind() == GeometryKind::Point {
        bail!(
            "theme '{}' asks for MEASURE on point layer '{}'; points have no area or length",
            theme.theme_name,
            values.name()
        );
    }

    // Resolve reporting fields against the layer's dbf schema once.
    let lookup = values.field_lookup();
    let fields = theme
        .reporting_fields
        .iter()
        .map(|field| {
            lookup.get(&field.to_lowercase()).cloned().with_context(|| {
                format!(
                    "reporting field '{}' not found in layer '{}'",
                    field,
                    values.name()
                )
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let filter = theme
        .definition_query
        .as_deref()
        .map(query::parse)
        .transpose()
        .with_context(|| {
            format!(
                "invalid definition query for theme '{}'",
                theme.theme_name
            )
        })?;

    for value_feature in values.features() {
        if let Some(expr) = &filter {
            if !expr.matches(&value_feature.record, &lookup) {
                continue;
            }
        }
        let Some(rect) = value_feature.geom.bounding_rect() else {
            continue;
        };
        let envelope = AABB::from_corners(rect.min().into(), rect.max().into());

        for candidate in subject.query(&envelope) {
            let subject_feature = &subject.features()[candidate.idx()];
            if !subject_feature.geom.intersects_interior(&value_feature.geom) {
                continue;
            }
            stats.pairs += 1;

            let feature_id = &subject_ids[candidate.idx()];
            let Some(rows) = table.bucket_rows_mut(feature_id, &theme.theme_name, location) else {
                continue;
            };
            let attrs = clean_attrs(&value_feature.record, &fields);
            match theme.method {
                CheckMethod::Present => merge_presence(rows, attrs),
                CheckMethod::Count => merge_count(rows, attrs),
                CheckMethod::Measure => {
                    let piece = subject_feature.geom.clip(&value_feature.geom);
                    let measure = match values.kind() {
                        GeometryKind::Polygon => piece.area_m2() / 10_000.0, // hectares
                        GeometryKind::Line => piece.length_m() / 1_000.0,    // kilometres
                        GeometryKind::Point => 0.0, // rejected above
                    };
                    if measure > 0.0 {
                        merge_measure(rows, attrs, measure);
                    }
                }
            }
        }
    }
    Ok(stats)
}
