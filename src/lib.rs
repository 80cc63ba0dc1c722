//! # Spectra Data Downloader Library
//!
//! A convenience layer over the DACE spectroscopy archive and the SIMBAD
//! catalog for enumerating, filtering and bulk-downloading the spectroscopic
//! time series of a named star, with unpack-and-flatten post-processing of
//! the downloaded archives.
//!
//! ## Features
//!
//! - **Lazy metadata cache**: the per-target instrument / pipeline /
//!   observation-mode mapping is fetched once per [`Star`] and served from
//!   the cached snapshot afterwards
//! - **Filtered traversal**: one lazy traversal primitive with
//!   containment-matching filters at every level backs all read operations
//! - **Idempotent downloads**: files whose stem already exists under the
//!   destination tree are skipped unless forced
//! - **Folder organization**: downloads are grouped per instrument and
//!   pipeline, extracted in place and flattened to plain `.fits` files
//! - **Catalog lookups**: spectral type and cross-identifiers via SIMBAD
//!
//! ## Quick Start
//!
//! ```no_run
//! use spectra_data_downloader::{DownloadOptions, EntryFilter, Star};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let star = Star::new("HD 40307");
//!
//! // What is on the archive for this target?
//! for instrument in star.available_instruments()? {
//!     println!("{instrument}: {:?}", star.pipelines_of_instrument(&instrument)?);
//! }
//!
//! // Pull every ESPRESSO raw file into ./spectra/<instrument>/<pipeline>/
//! let options = DownloadOptions::new("./spectra")
//!     .with_filter(EntryFilter::new().instrument("ESPRESSO"));
//! let report = star.download_data(&options)?;
//! println!("{} files requested", report.files_requested);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`star`] - the [`Star`] entity: cached mapping, queries, downloads
//! - [`timeseries`] - the nested mapping model and its traversal primitive
//! - [`instruments`] - overridable instrument alias / default-pipeline facts
//! - [`archive`] - the archive collaborator trait and the DACE HTTP client
//! - [`catalog`] - the catalog collaborator trait and the SIMBAD client
//! - [`download`] - download planning, extraction and flattening
//! - [`cli`] - CLI command implementations
//!
//! Every network call is synchronous and blocking, and no retry or
//! concurrency machinery exists at this layer; timeouts and retries are
//! whatever the transport provides.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Archive collaborator trait and DACE HTTP client
pub mod archive;

/// Catalog collaborator trait and SIMBAD client
pub mod catalog;

/// CLI command implementations
pub mod cli;

/// Download planning and post-processing
pub mod download;

/// Instrument fact tables
pub mod instruments;

/// The star entity
pub mod star;

/// Nested time-series mapping and traversal
pub mod timeseries;

// Re-export commonly used types
pub use archive::FileType;
pub use download::{DownloadOptions, DownloadReport};
pub use star::{Star, StarError};
pub use timeseries::{EntryFilter, MetricValue, TimeSeries, TimeSeriesEntry};
