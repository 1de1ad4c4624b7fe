//! The intersection engine: record cleaning plus the bulk spatial join that
//! feeds the output table.

mod clean;
mod intersect;

pub use clean::{MAX_FIELD_LEN, MAX_ROW_LEN, clean_attrs, clean_field};
pub use intersect::{IntersectStats, intersect_layer};
