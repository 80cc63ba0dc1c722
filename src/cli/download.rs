//! Download command implementation

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::archive::FileType;
use crate::download::DownloadOptions;

use super::{build_star, entry_filter, Cli, CliError};

/// Download subcommand
#[derive(Debug, Args)]
pub struct DownloadCommand {
    /// Catalog name of the target star
    pub target: String,

    /// Directory the spectra land under
    #[arg(long, short)]
    pub output: PathBuf,

    /// Restrict to instruments whose name contains this token
    #[arg(long)]
    pub instrument: Option<String>,

    /// Restrict to observation modes whose name contains this token
    #[arg(long)]
    pub mode: Option<String>,

    /// Restrict to pipelines whose name contains this token
    #[arg(long)]
    pub pipeline: Option<String>,

    /// Raw-file class to download: all, s1d, s2d or ccf
    #[arg(long, default_value = "all")]
    pub file_type: String,

    /// Download even if files with the same stem already exist on disk
    #[arg(long)]
    pub force: bool,

    /// Leave the transferred archives packed
    #[arg(long)]
    pub no_unpack: bool,

    /// Keep the extracted files in the archive's directory layout
    #[arg(long)]
    pub no_flatten: bool,

    /// Put everything directly under the output directory
    #[arg(long)]
    pub no_subfolders: bool,
}

impl DownloadCommand {
    /// Download the matching raw files
    pub fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let file_type = FileType::from_str(&self.file_type).map_err(CliError::InvalidArgument)?;

        let star = build_star(&self.target, cli.api_user.as_deref());
        let filter = entry_filter(
            self.instrument.as_deref(),
            self.mode.as_deref(),
            self.pipeline.as_deref(),
        );

        let options = DownloadOptions::new(&self.output)
            .with_filter(filter)
            .with_file_type(file_type)
            .with_force(self.force)
            .with_unpack(!self.no_unpack)
            .with_flatten(!self.no_flatten)
            .with_subfolders(!self.no_subfolders);

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(format!("downloading spectra of {}", self.target));
        spinner.enable_steady_tick(Duration::from_millis(120));

        let result = star.download_data(&options);
        spinner.finish_and_clear();
        let report = result?;

        println!("Processed {} matching time-series entries", report.entries_matched);
        println!(
            "Requested {} files in {} batches ({} already on disk)",
            report.files_requested, report.groups_downloaded, report.files_skipped
        );
        Ok(())
    }
}
