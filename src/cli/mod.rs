//! CLI command implementations

use crate::star::Star;
use crate::timeseries::EntryFilter;
use clap::{Parser, Subcommand};

pub mod download;
pub mod error;
pub mod info;
pub mod list;
pub mod rvs;

pub use download::DownloadCommand;
pub use error::CliError;
pub use info::InfoCommand;
pub use list::ListCommand;
pub use rvs::RvsCommand;

/// Download and organize spectroscopic time-series data from the DACE archive
#[derive(Debug, Parser)]
#[command(name = "spectra-data-downloader", version, about)]
pub struct Cli {
    /// Fetch archive metadata under a named credential profile
    #[arg(long, global = true)]
    pub api_user: Option<String>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the instrument / pipeline / observation-mode tree of a target
    List(ListCommand),

    /// Print catalog information (spectral type, aliases) for a target
    Info(InfoCommand),

    /// Print or export the radial-velocity table of a target
    Rvs(RvsCommand),

    /// Download the raw spectroscopy files of a target
    Download(DownloadCommand),
}

/// Build a star for a command invocation
pub(crate) fn build_star(target: &str, api_user: Option<&str>) -> Star {
    let mut star = Star::new(target);
    if let Some(profile) = api_user {
        star = star.with_api_user(profile);
    }
    star
}

/// Build the entry filter shared by the filtering subcommands
pub(crate) fn entry_filter(
    instrument: Option<&str>,
    mode: Option<&str>,
    pipeline: Option<&str>,
) -> EntryFilter {
    let mut filter = EntryFilter::new();
    if let Some(token) = instrument {
        filter = filter.instrument(token);
    }
    if let Some(token) = mode {
        filter = filter.mode(token);
    }
    if let Some(token) = pipeline {
        filter = filter.pipeline(token);
    }
    filter
}
