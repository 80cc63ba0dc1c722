//! Info command implementation

use clap::Args;

use super::{build_star, Cli, CliError};

/// Info subcommand
#[derive(Debug, Args)]
pub struct InfoCommand {
    /// Catalog name of the target star
    pub target: String,
}

impl InfoCommand {
    /// Print the spectral class and catalog aliases of the target
    pub fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let star = build_star(&self.target, cli.api_user.as_deref());

        println!("{}", self.target);
        println!("  spectral type: {}", star.spectral_type()?);
        println!("  aliases:");
        for alias in star.aliases()? {
            println!("    {alias}");
        }
        Ok(())
    }
}
