//! CLI error types and conversions

use crate::archive::ArchiveError;
use crate::catalog::CatalogError;
use crate::download::DownloadError;
use crate::star::StarError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Star query error
    #[error("star error: {0}")]
    StarError(#[from] StarError),

    /// Download error
    #[error("download error: {0}")]
    DownloadError(#[from] DownloadError),

    /// Archive client error
    #[error("archive error: {0}")]
    ArchiveError(#[from] ArchiveError),

    /// Catalog client error
    #[error("catalog error: {0}")]
    CatalogError(#[from] CatalogError),

    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Output write error
    #[error("output error: {0}")]
    OutputError(String),
}
