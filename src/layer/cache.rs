use std::collections::hash_map::Entry;
use std::path::Path;

use ahash::AHashMap;
use anyhow::Result;

use crate::geom::{BufferSide, GeometryKind};

use super::layer::Layer;

/// Owns every prepared layer for a run: the subject layer, its buffered
/// variants keyed by distance, and the value layers keyed by resolved source.
/// Layers are built on first demand and never rebuilt.
#[derive(Debug)]
pub struct LayerCache {
    subject: Layer,
    buffers: AHashMap<u64, Layer>,
    values: AHashMap<String, Layer>,
}

impl LayerCache {
    pub fn new(subject: Layer) -> Self {
        Self {
            subject,
            buffers: AHashMap::new(),
            values: AHashMap::new(),
        }
    }

    pub fn subject(&self) -> &Layer {
        &self.subject
    }

    /// Get the buffered subject layer for a distance, building it if absent.
    /// Polygon subjects keep only the outside ring; lines and points get the
    /// full footprint.
    pub fn get_or_build_buffer(&mut self, distance: f64) -> Result<&Layer> {
        match self.buffers.entry(Self::key(distance)) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(slot) => {
                let side = if self.subject.kind() == GeometryKind::Polygon {
                    BufferSide::RingOnly
                } else {
                    BufferSide::Full
                };
                Ok(slot.insert(self.subject.buffered(distance, side)?))
            }
        }
    }

    pub fn buffer(&self, distance: f64) -> Option<&Layer> {
        self.buffers.get(&Self::key(distance))
    }

    /// Get a value layer by cache key, loading it from `path` if absent.
    pub fn get_or_load_value(&mut self, key: &str, path: &Path) -> Result<&Layer> {
        match self.values.entry(key.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(slot) => {
                let name = crate::common::basename(path);
                Ok(slot.insert(Layer::from_shapefile(&name, path)?))
            }
        }
    }

    pub fn value(&self, key: &str) -> Option<&Layer> {
        self.values.get(key)
    }

    // Millimetre key sidesteps float map keys.
    fn key(distance: f64) -> u64 {
        (distance * 1000.0).round() as u64
    }
}
