use clap::{Parser, ValueHint};
use std::path::PathBuf;

/// Values checking CLI (argument schema only)
#[derive(Parser, Debug, Clone)]
#[command(name = "valuecheck", version, about)]
pub struct Cli {
    /// Input feature dataset (.shp) whose features are checked
    #[arg(value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Attribute field holding the unique feature identifier
    #[arg(long)]
    pub id_field: String,

    /// Theme reference table (.csv)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub ref_table: PathBuf,

    /// Base directory for value layers flagged as default-workspace
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub data_root: PathBuf,

    /// Output directory for the report and the run log
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub out_dir: PathBuf,

    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
