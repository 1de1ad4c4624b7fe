use std::cmp::Ordering;
use std::fmt;
use std::path::Path;

use ahash::AHashMap;
use anyhow::{Context, Result, bail};
use rstar::{AABB, RTree};
use shapefile::Reader;
use shapefile::dbase::{FieldValue, Record};
use tracing::warn;

use crate::geom::{BufferSide, Geom, GeometryKind, buffer_geom, shape_to_geom};

use super::bbox::BoundingBox;

/// One spatial record: geometry plus its attribute row.
#[derive(Debug, Clone)]
pub struct Feature {
    pub geom: Geom,
    pub record: Record,
}

/// A named in-memory geometry layer with an R-tree over feature bounds.
#[derive(Debug)]
pub struct Layer {
    name: String,
    kind: GeometryKind,
    features: Vec<Feature>,
    fields: Vec<String>,
    rtree: RTree<BoundingBox>,
}

impl Layer {
    /// Construct a layer from features already in memory.
    pub fn new(name: impl Into<String>, kind: GeometryKind, features: Vec<Feature>) -> Self {
        let fields = features
            .first()
            .map(|f| f.record.clone().into_iter().map(|(name, _)| name).collect())
            .unwrap_or_default();
        let rtree = RTree::bulk_load(
            features
                .iter()
                .enumerate()
                .filter_map(|(i, f)| f.geom.bounding_rect().map(|rect| BoundingBox::new(i, rect)))
                .collect(),
        );
        Self { name: name.into(), kind, features, fields, rtree }
    }

    /// Load all shapes and attribute records from a `.shp` file path.
    pub fn from_shapefile(name: &str, path: &Path) -> Result<Self> {
        let mut reader = Reader::from_path(path)
            .with_context(|| format!("Failed to open shapefile: {}", path.display()))?;

        let mut features = Vec::with_capacity(reader.shape_count()?);
        let mut kind: Option<GeometryKind> = None;
        for result in reader.iter_shapes_and_records() {
            let (shape, record) = result.context("Error reading shape+record")?;
            let Some(geom) = shape_to_geom(&shape)
                .with_context(|| format!("Unsupported geometry in {}", path.display()))?
            else {
                warn!("Skipping record with null geometry in {name}");
                continue;
            };
            if geom.is_empty() {
                warn!("Skipping record with empty geometry in {name}");
                continue;
            }
            match kind {
                None => kind = Some(geom.kind()),
                Some(k) if k != geom.kind() => {
                    bail!("Mixed geometry kinds in {}", path.display())
                }
                _ => {}
            }
            features.push(Feature { geom, record });
        }

        if features.is_empty() {
            warn!("Layer {name} contains no usable geometries");
        }
        Ok(Self::new(name, kind.unwrap_or(GeometryKind::Polygon), features))
    }

    /// Derive a buffered copy: one buffer feature per input feature, records
    /// carried over, order preserved.
    pub fn buffered(&self, distance: f64, side: BufferSide) -> Result<Layer> {
        let features = self
            .features
            .iter()
            .map(|f| {
                Ok(Feature {
                    geom: buffer_geom(&f.geom, distance, side)?,
                    record: f.record.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("Failed to buffer layer {}", self.name))?;
        Ok(Self::new(
            format!("{}_{}", self.name, distance),
            GeometryKind::Polygon,
            features,
        ))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> GeometryKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Attribute field names, in dbf order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Map of lowercased field name to the dbf spelling.
    pub fn field_lookup(&self) -> AHashMap<String, String> {
        self.fields
            .iter()
            .map(|f| (f.to_lowercase(), f.clone()))
            .collect()
    }

    /// Query the R-tree for features whose bounds intersect the given envelope.
    pub(crate) fn query(&self, envelope: &AABB<[f64; 2]>) -> impl Iterator<Item = &BoundingBox> {
        self.rtree.locate_in_envelope_intersecting(envelope)
    }
}

/// Stable identifier of a subject feature. The dbf column type fixes the
/// variant for a whole run, so ordering never mixes the two.
#[derive(Debug, Clone)]
pub enum FeatureId {
    Text(String),
    Number(f64),
}

impl Ord for FeatureId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (FeatureId::Number(a), FeatureId::Number(b)) => a.total_cmp(b),
            (FeatureId::Text(a), FeatureId::Text(b)) => a.cmp(b),
            (FeatureId::Number(_), FeatureId::Text(_)) => Ordering::Less,
            (FeatureId::Text(_), FeatureId::Number(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for FeatureId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for FeatureId {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FeatureId {}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureId::Text(s) => f.write_str(s),
            FeatureId::Number(n) => write!(f, "{n}"),
        }
    }
}

/// Read the identifier of every feature, in layer order.
pub fn feature_ids(layer: &Layer, id_field: &str) -> Result<Vec<FeatureId>> {
    layer
        .features()
        .iter()
        .enumerate()
        .map(|(i, f)| match f.record.get(id_field) {
            Some(FieldValue::Character(Some(s))) => Ok(FeatureId::Text(s.trim().to_string())),
            Some(FieldValue::Numeric(Some(n))) => Ok(FeatureId::Number(*n)),
            Some(FieldValue::Integer(n)) => Ok(FeatureId::Number(*n as f64)),
            Some(FieldValue::Double(n)) => Ok(FeatureId::Number(*n)),
            Some(FieldValue::Float(Some(n))) => Ok(FeatureId::Number(*n as f64)),
            _ => bail!(
                "ID field '{}' is missing or empty on record {} of {}",
                id_field,
                i,
                layer.name()
            ),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{MultiPolygon, polygon};

    fn record_with(name: &str, value: FieldValue) -> Record {
        let mut record = Record::default();
        record.insert(name.to_string(), value);
        record
    }

    fn square_at(x: f64, y: f64) -> Geom {
        Geom::Polygon(MultiPolygon::new(vec![polygon![
            (x: x, y: y),
            (x: x + 10.0, y: y),
            (x: x + 10.0, y: y + 10.0),
            (x: x, y: y + 10.0),
        ]]))
    }

    #[test]
    fn feature_ids_follow_the_dbf_column_type() {
        let layer = Layer::new(
            "works",
            GeometryKind::Polygon,
            vec![
                Feature {
                    geom: square_at(0.0, 0.0),
                    record: record_with("REF", FieldValue::Numeric(Some(12.0))),
                },
                Feature {
                    geom: square_at(20.0, 0.0),
                    record: record_with("REF", FieldValue::Numeric(Some(3.0))),
                },
            ],
        );
        let ids = feature_ids(&layer, "REF").unwrap();
        assert_eq!(ids, vec![FeatureId::Number(12.0), FeatureId::Number(3.0)]);
        assert!(ids[1] < ids[0]);
        assert_eq!(ids[0].to_string(), "12");
    }

    #[test]
    fn missing_id_field_is_an_error() {
        let layer = Layer::new(
            "works",
            GeometryKind::Polygon,
            vec![Feature {
                geom: square_at(0.0, 0.0),
                record: record_with("OTHER", FieldValue::Integer(1)),
            }],
        );
        assert!(feature_ids(&layer, "REF").is_err());
    }

    #[test]
    fn field_lookup_is_case_insensitive() {
        let layer = Layer::new(
            "values",
            GeometryKind::Polygon,
            vec![Feature {
                geom: square_at(0.0, 0.0),
                record: record_with("SiteName", FieldValue::Character(Some("a".into()))),
            }],
        );
        assert_eq!(
            layer.field_lookup().get("sitename"),
            Some(&"SiteName".to_string())
        );
    }
}
