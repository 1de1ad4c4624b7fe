//! Geometry support: shapefile conversion, spatial predicates, buffer zones.

mod buffer;
mod convert;
mod geometry;

pub use buffer::{BufferSide, buffer_geom};
pub use convert::shape_to_geom;
pub use geometry::{Geom, GeometryKind};
