use anyhow::Result;
use clap::Parser;

use valuecheck::cli::Cli;
use valuecheck::{logging, run};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = logging::init(&cli.out_dir, cli.verbose)?;

    match run::execute(&cli) {
        Ok(_) => Ok(()),
        Err(e) => {
            tracing::error!("Script execution failed: {e:#}");
            Err(e)
        }
    }
}
