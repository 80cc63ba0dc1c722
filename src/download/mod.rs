//! Download planning and post-processing
//!
//! Turning a filtered set of time-series leaves into files on disk happens
//! in three steps: [`plan::plan_downloads`] groups the remote files by
//! destination directory and drops the ones already present, the archive
//! client transfers each group as one compressed archive, and [`unpack`]
//! extracts and flattens the result.

use crate::archive::FileType;
use crate::star::StarError;
use crate::timeseries::EntryFilter;
use std::path::PathBuf;

pub mod plan;
pub mod unpack;

pub use plan::{plan_downloads, DownloadPlan};

/// Deterministic name for each transferred archive
pub const DEFAULT_ARCHIVE_NAME: &str = "result.tar.gz";

/// Extension of the data files worth flattening after extraction
pub const DATA_FILE_EXTENSION: &str = "fits";

/// Download errors
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// Remote file path missing the instrument/pipeline prefix
    #[error("malformed remote file path: {0}")]
    MalformedRemotePath(String),

    /// A matching leaf carries no raw-file list
    #[error("entry {instrument}/{pipeline}/{mode} has no raw_file metric")]
    MissingRawFiles {
        /// Instrument key of the offending leaf
        instrument: String,
        /// Pipeline key of the offending leaf
        pipeline: String,
        /// Observation-mode key of the offending leaf
        mode: String,
    },

    /// Unpacking found an unexpected number of archive files
    #[error("expected exactly one downloaded archive under {dir}, found {found}")]
    ArchiveCount {
        /// Destination directory that was scanned
        dir: String,
        /// Number of archive files found
        found: usize,
    },

    /// Archive extraction error
    #[error("extraction error: {0}")]
    ExtractionError(String),

    /// Archive client error
    #[error("transfer error: {0}")]
    TransferError(#[from] crate::archive::ArchiveError),

    /// Star query error
    #[error("star error: {0}")]
    StarError(#[from] StarError),
}

/// Result type for download operations
pub type DownloadResult<T> = Result<T, DownloadError>;

/// What and how to download for one invocation
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// Root directory the spectra land under
    pub output_dir: PathBuf,
    /// Restrict to matching instruments/pipelines/modes
    pub filter: EntryFilter,
    /// Raw-file class passed to the archive
    pub file_type: FileType,
    /// Download even when files with the same stem already exist on disk
    pub force: bool,
    /// Extract each transferred archive in place
    pub unpack: bool,
    /// After extraction, move data files up to the destination root
    pub flatten: bool,
    /// Divide the output tree by instrument and pipeline name
    pub subfolders: bool,
}

impl DownloadOptions {
    /// Defaults: unpack, flatten and subfolder, download all file classes,
    /// skip files already on disk
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            filter: EntryFilter::new(),
            file_type: FileType::All,
            force: false,
            unpack: true,
            flatten: true,
            subfolders: true,
        }
    }

    /// Restrict to matching instruments/pipelines/modes
    pub fn with_filter(mut self, filter: EntryFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Select the raw-file class to transfer
    pub fn with_file_type(mut self, file_type: FileType) -> Self {
        self.file_type = file_type;
        self
    }

    /// Download even when files with the same stem already exist on disk
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Enable or disable in-place extraction
    pub fn with_unpack(mut self, unpack: bool) -> Self {
        self.unpack = unpack;
        self
    }

    /// Enable or disable post-extraction flattening
    pub fn with_flatten(mut self, flatten: bool) -> Self {
        self.flatten = flatten;
        self
    }

    /// Enable or disable per-instrument/pipeline subfolders
    pub fn with_subfolders(mut self, subfolders: bool) -> Self {
        self.subfolders = subfolders;
        self
    }
}

/// Outcome summary of one download invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadReport {
    /// Time-series leaves that matched the filter
    pub entries_matched: usize,
    /// Files handed to the archive client
    pub files_requested: usize,
    /// Files dropped because a same-stem file already existed
    pub files_skipped: usize,
    /// Destination groups that actually transferred
    pub groups_downloaded: usize,
}
