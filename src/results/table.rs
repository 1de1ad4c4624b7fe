use std::collections::BTreeMap;

use ahash::AHashMap;
use smallvec::SmallVec;

use crate::layer::FeatureId;

/// Cleaned attribute values forming the merge key of a result row.
pub type AttrTuple = SmallVec<[String; 4]>;

/// Trailing accumulator cell of an aggregated row.
#[derive(Debug, Clone, PartialEq)]
pub enum Accumulator {
    Presence,
    Count(u64),
    Measure(f64),
}

/// One merged result row: attribute key plus its accumulator.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedRow {
    pub attrs: AttrTuple,
    pub accum: Accumulator,
}

/// Where an intersection was found relative to the subject feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    InPolygon,
    InBuffer,
}

/// Result rows for one (feature, theme) pair, split by location.
#[derive(Debug, Clone, Default)]
pub struct ThemeBucket {
    pub in_polygon: Vec<AggregatedRow>,
    pub in_buffer: Vec<AggregatedRow>,
}

impl ThemeBucket {
    pub fn rows_mut(&mut self, location: Location) -> &mut Vec<AggregatedRow> {
        match location {
            Location::InPolygon => &mut self.in_polygon,
            Location::InBuffer => &mut self.in_buffer,
        }
    }
}

/// Record a presence hit: identical attribute tuples collapse to one row.
pub fn merge_presence(rows: &mut Vec<AggregatedRow>, attrs: AttrTuple) {
    if !rows.iter().any(|row| row.attrs == attrs) {
        rows.push(AggregatedRow {
            attrs,
            accum: Accumulator::Presence,
        });
    }
}

/// Record a counted hit: matching rows increment, new keys start at one.
pub fn merge_count(rows: &mut Vec<AggregatedRow>, attrs: AttrTuple) {
    for row in rows.iter_mut() {
        if row.attrs == attrs {
            if let Accumulator::Count(n) = &mut row.accum {
                *n += 1;
                return;
            }
        }
    }
    rows.push(AggregatedRow {
        attrs,
        accum: Accumulator::Count(1),
    });
}

/// Record a measured hit: matching rows accumulate, new keys start at the
/// given measure.
pub fn merge_measure(rows: &mut Vec<AggregatedRow>, attrs: AttrTuple, measure: f64) {
    for row in rows.iter_mut() {
        if row.attrs == attrs {
            if let Accumulator::Measure(total) = &mut row.accum {
                *total += measure;
                return;
            }
        }
    }
    rows.push(AggregatedRow {
        attrs,
        accum: Accumulator::Measure(measure),
    });
}

/// The whole run's results: feature -> theme -> bucket. Every pair is present
/// from the start, so an empty bucket means "checked, nothing found".
#[derive(Debug, Default)]
pub struct OutputTable {
    rows: BTreeMap<FeatureId, AHashMap<String, ThemeBucket>>,
}

impl OutputTable {
    /// Initialise with every (feature, theme) pair empty. Duplicate feature
    /// IDs collapse into one report row.
    pub fn init(ids: impl IntoIterator<Item = FeatureId>, themes: &[String]) -> Self {
        let mut rows = BTreeMap::new();
        for id in ids {
            let buckets: AHashMap<String, ThemeBucket> = themes
                .iter()
                .map(|theme| (theme.clone(), ThemeBucket::default()))
                .collect();
            rows.insert(id, buckets);
        }
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Feature IDs in ascending order.
    pub fn feature_ids(&self) -> impl Iterator<Item = &FeatureId> {
        self.rows.keys()
    }

    pub fn bucket(&self, id: &FeatureId, theme: &str) -> Option<&ThemeBucket> {
        self.rows.get(id).and_then(|buckets| buckets.get(theme))
    }

    pub fn bucket_rows_mut(
        &mut self,
        id: &FeatureId,
        theme: &str,
        location: Location,
    ) -> Option<&mut Vec<AggregatedRow>> {
        self.rows
            .get_mut(id)
            .and_then(|buckets| buckets.get_mut(theme))
            .map(|bucket| bucket.rows_mut(location))
    }
}
