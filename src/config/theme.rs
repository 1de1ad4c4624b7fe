use std::fmt;
use std::path::PathBuf;

use anyhow::{Result, bail};

use crate::geom::GeometryKind;

/// How a theme's intersections are aggregated into the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckMethod {
    Present,
    Count,
    Measure,
}

impl CheckMethod {
    /// Parse a CHECK_METHOD cell. Anything outside the closed set is a
    /// configuration error.
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_uppercase().as_str() {
            "PRESENT" => Ok(CheckMethod::Present),
            "COUNT" => Ok(CheckMethod::Count),
            "MEASURE" => Ok(CheckMethod::Measure),
            other => bail!("unknown check method '{other}'"),
        }
    }
}

impl fmt::Display for CheckMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CheckMethod::Present => "PRESENT",
            CheckMethod::Count => "COUNT",
            CheckMethod::Measure => "MEASURE",
        })
    }
}

/// One configured value layer: where it lives and how to report it.
/// Built once from the reference table, immutable afterwards.
#[derive(Debug, Clone)]
pub struct ThemeDefinition {
    /// Report column header; unique across enabled themes.
    pub theme_name: String,
    /// Resolved path of the layer source.
    pub source_path: PathBuf,
    /// Cache key for the shared value-layer cache.
    pub source_key: String,
    /// Attribute pre-filter; `None` means no filter.
    pub definition_query: Option<String>,
    pub method: CheckMethod,
    /// Up to four non-blank attribute fields to report.
    pub reporting_fields: Vec<String>,
    /// Metres; zero disables the buffer pass.
    pub buffer_distance: f64,
    /// Geometry family of the source layer; `None` when the layer failed to
    /// load (such themes report Nil everywhere).
    pub geometry_kind: Option<GeometryKind>,
}
