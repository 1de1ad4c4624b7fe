//! Theme configuration: the reference table and its in-memory form.

mod reftab;
mod theme;

pub use reftab::load_reference_table;
pub use theme::{CheckMethod, ThemeDefinition};
