//! Spectroscopy archive clients
//!
//! The archive collaborator is reached through the [`SpectroscopyArchive`]
//! trait: one call fetches the nested time-series mapping for a target, one
//! call transfers a batch of remote files as a single compressed archive on
//! disk. [`DaceArchiveClient`] is the HTTP implementation; tests substitute
//! in-memory fakes.

use crate::timeseries::TimeSeries;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub mod credentials;
pub mod dace;

pub use credentials::CredentialStore;
pub use dace::DaceArchiveClient;

/// Archive client errors
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// HTTP error response
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Network error
    #[error("network error: {0}")]
    NetworkError(String),

    /// Response parse error
    #[error("parse error: {0}")]
    ParseError(String),

    /// Credential lookup or credential file error
    #[error("credential error: {0}")]
    CredentialError(String),

    /// Target unknown to the archive
    #[error("no time series found for target {0}")]
    TargetNotFound(String),

    /// IO error while writing a transferred archive
    #[error("IO error: {0}")]
    IoError(String),
}

/// Result type for archive operations
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Raw-file class selector for batch transfers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FileType {
    /// Every file class
    #[serde(rename = "all")]
    #[default]
    All,
    /// One-dimensional extracted spectra
    #[serde(rename = "s1d")]
    S1d,
    /// Two-dimensional (order-by-order) spectra
    #[serde(rename = "s2d")]
    S2d,
    /// Cross-correlation functions
    #[serde(rename = "ccf")]
    Ccf,
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FileType::All => "all",
            FileType::S1d => "s1d",
            FileType::S2d => "s2d",
            FileType::Ccf => "ccf",
        };
        write!(f, "{s}")
    }
}

impl FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(FileType::All),
            "s1d" => Ok(FileType::S1d),
            "s2d" => Ok(FileType::S2d),
            "ccf" => Ok(FileType::Ccf),
            _ => Err(format!("Invalid file type: {s}. Valid options: all, s1d, s2d, ccf")),
        }
    }
}

/// Archive collaborator interface
///
/// Calls are synchronous and blocking; any timeout or retry behavior is
/// whatever the transport underneath provides.
pub trait SpectroscopyArchive {
    /// Fetch the time-series mapping for a target, grouped by instrument
    fn timeseries(&self, target: &str) -> ArchiveResult<TimeSeries>;

    /// Transfer a batch of remote files as one compressed archive
    ///
    /// The archive lands at `output_directory/output_filename`; the returned
    /// path points at it.
    fn download_files(
        &self,
        files: &[String],
        output_directory: &Path,
        file_type: FileType,
        output_filename: &str,
    ) -> ArchiveResult<PathBuf>;
}
