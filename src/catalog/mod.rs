//! Catalog lookup clients
//!
//! Catalog lookups are one-shot, read-only calls reached through the
//! [`CatalogService`] trait: resolve the spectral type of a named object and
//! resolve its cross-identifiers. [`SimbadClient`] is the HTTP
//! implementation; tests substitute in-memory fakes.

pub mod simbad;

pub use simbad::SimbadClient;

/// Catalog client errors
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Object unknown to the catalog
    #[error("couldn't find the object {0} in the catalog")]
    ObjectNotFound(String),

    /// HTTP error response
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Network error
    #[error("network error: {0}")]
    NetworkError(String),

    /// Response parse error
    #[error("parse error: {0}")]
    ParseError(String),
}

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Catalog collaborator interface
pub trait CatalogService {
    /// The raw spectral-type field for an object, as the catalog reports it
    fn spectral_type(&self, object_name: &str) -> CatalogResult<String>;

    /// Every identifier the catalog knows the object under
    fn object_identifiers(&self, object_name: &str) -> CatalogResult<Vec<String>>;
}

/// Reduce a raw spectral-type field to its two-character class
///
/// Keeps the first two characters and strips the dwarf prefix marker `d`,
/// so `"G2V"` becomes `"G2"` and `"dM2.5"` becomes `"M"`.
pub fn parse_spectral_class(raw: &str) -> String {
    raw.chars().take(2).filter(|c| *c != 'd').collect()
}
