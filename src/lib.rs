#![doc = "Valuecheck public API"]
pub mod cli;
mod common;
pub mod config;
pub mod engine;
mod geom;
pub mod layer;
pub mod logging;
mod query;
pub mod report;
pub mod results;
pub mod run;

#[doc(inline)]
pub use config::{CheckMethod, ThemeDefinition};

#[doc(inline)]
pub use geom::{BufferSide, Geom, GeometryKind};

#[doc(inline)]
pub use layer::{FeatureId, Layer, LayerCache};

#[doc(inline)]
pub use results::{AggregatedRow, OutputTable};

#[doc(inline)]
pub use run::execute;
