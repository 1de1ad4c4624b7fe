//! Structured result storage and the merge rules of the three check methods.

mod table;

pub use table::{
    Accumulator, AggregatedRow, AttrTuple, Location, OutputTable, ThemeBucket, merge_count,
    merge_measure, merge_presence,
};
