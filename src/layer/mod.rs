//! In-memory layers: shapefile ingestion, feature identifiers, caching.

mod bbox;
mod cache;
mod layer;

pub use cache::LayerCache;
pub use layer::{Feature, FeatureId, Layer, feature_ids};
