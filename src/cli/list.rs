//! List command implementation

use clap::Args;
use tracing::info;

use super::{build_star, Cli, CliError};

/// List subcommand
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Catalog name of the target star
    pub target: String,
}

impl ListCommand {
    /// Print the instrument / pipeline / observation-mode tree
    pub fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let star = build_star(&self.target, cli.api_user.as_deref());

        let instruments = star.available_instruments()?;
        if instruments.is_empty() {
            info!(star = %self.target, "no time series found");
            println!("{}: no time series available", self.target);
            return Ok(());
        }

        println!("{}", self.target);
        for instrument in instruments {
            println!("  {instrument}");
            for pipeline in star.pipelines_of_instrument(&instrument)? {
                println!("    {pipeline}");
                for mode in star.observation_modes(&instrument, &pipeline)? {
                    println!("      {mode}");
                }
            }
        }
        Ok(())
    }
}
