//! The star entity
//!
//! A [`Star`] wraps one named target's nested time-series mapping, fetched
//! from the archive at most once and cached for the instance's lifetime.
//! Every read operation is a view over that cached mapping built on the
//! [`TimeSeries::entries`] traversal; downloads plan against it and hand the
//! surviving file batches to the archive client.

use crate::archive::{ArchiveError, DaceArchiveClient, SpectroscopyArchive};
use crate::catalog::{parse_spectral_class, CatalogError, CatalogService, SimbadClient};
use crate::download::{
    plan_downloads, unpack, DownloadError, DownloadOptions, DownloadReport, DATA_FILE_EXTENSION,
    DEFAULT_ARCHIVE_NAME,
};
use crate::instruments::InstrumentTables;
use crate::timeseries::{EntryFilter, MetricMap, MetricValue, TimeSeries, TimeSeriesEntry};
use once_cell::sync::OnceCell;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{info, warn};

/// Per-leaf header values, keyed instrument → observation mode → pipeline
pub type HeaderInfo = BTreeMap<String, BTreeMap<String, BTreeMap<String, MetricMap>>>;

/// Metrics requested by [`Star::radial_velocities`]
pub const RV_METRICS: [&str; 3] = ["rjd", "rv", "rv_err"];

/// Star query errors
#[derive(Debug, thiserror::Error)]
pub enum StarError {
    /// Instrument absent from the cached mapping
    #[error("unknown instrument: {0}")]
    UnknownInstrument(String),

    /// Pipeline absent from an instrument's pipeline list
    #[error("unknown pipeline {pipeline} for instrument {instrument}")]
    UnknownPipeline {
        /// Instrument that was queried
        instrument: String,
        /// Pipeline that was not found under it
        pipeline: String,
    },

    /// Requested metric missing from a matching leaf
    #[error("metric {metric} missing from {instrument}/{pipeline}/{mode}")]
    UnknownMetric {
        /// Requested metric name
        metric: String,
        /// Instrument key of the offending leaf
        instrument: String,
        /// Pipeline key of the offending leaf
        pipeline: String,
        /// Observation-mode key of the offending leaf
        mode: String,
    },

    /// No pipeline-resolution rule applied
    #[error("no pipeline could be resolved for instrument {0}")]
    NoDefaultPipeline(String),

    /// Instrument fact tables unavailable
    #[error("instrument table error: {0}")]
    Tables(String),

    /// Archive client error
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// Catalog client error
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

/// Result type for star operations
pub type StarResult<T> = Result<T, StarError>;

/// One named target and its cached time-series mapping
///
/// Immutable after construction except for the lazily-computed cache: the
/// mapping is fetched on first use and never refreshed, so a long-lived
/// instance serves the snapshot it first saw. Discard and recreate the
/// `Star` to see new archive data.
pub struct Star {
    name: String,
    pipeline_hints: BTreeMap<String, String>,
    api_user: Option<String>,
    tables: Option<InstrumentTables>,
    archive: OnceCell<Box<dyn SpectroscopyArchive>>,
    catalog: OnceCell<Box<dyn CatalogService>>,
    timeseries: OnceCell<TimeSeries>,
}

impl Star {
    /// Create a star for a catalog name, using the public archive clients
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pipeline_hints: BTreeMap::new(),
            api_user: None,
            tables: None,
            archive: OnceCell::new(),
            catalog: OnceCell::new(),
            timeseries: OnceCell::new(),
        }
    }

    /// Pin the pipeline to use per instrument when several exist
    pub fn with_pipeline_hints(mut self, hints: BTreeMap<String, String>) -> Self {
        self.pipeline_hints = hints;
        self
    }

    /// Fetch archive metadata under a named credential profile
    pub fn with_api_user(mut self, profile: impl Into<String>) -> Self {
        self.api_user = Some(profile.into());
        self
    }

    /// Override the embedded instrument fact tables
    pub fn with_instrument_tables(mut self, tables: InstrumentTables) -> Self {
        self.tables = Some(tables);
        self
    }

    /// Substitute the archive client (used by tests)
    pub fn with_archive_client(self, client: Box<dyn SpectroscopyArchive>) -> Self {
        let _ = self.archive.set(client);
        self
    }

    /// Substitute the catalog client (used by tests)
    pub fn with_catalog_client(self, client: Box<dyn CatalogService>) -> Self {
        let _ = self.catalog.set(client);
        self
    }

    /// The catalog name this star was created with
    pub fn name(&self) -> &str {
        &self.name
    }

    fn archive_client(&self) -> &dyn SpectroscopyArchive {
        self.archive
            .get_or_init(|| {
                Box::new(DaceArchiveClient::new().with_profile(self.api_user.clone()))
            })
            .as_ref()
    }

    fn catalog_client(&self) -> &dyn CatalogService {
        self.catalog
            .get_or_init(|| Box::new(SimbadClient::new()))
            .as_ref()
    }

    fn tables(&self) -> StarResult<&InstrumentTables> {
        match &self.tables {
            Some(tables) => Ok(tables),
            None => InstrumentTables::embedded().map_err(|e| StarError::Tables(e.to_string())),
        }
    }

    /// The cached time-series mapping, fetching it on first use
    ///
    /// The fetch happens at most once per instance; later calls return the
    /// cached snapshot even if the archive has new data.
    pub fn timeseries(&self) -> StarResult<&TimeSeries> {
        self.timeseries.get_or_try_init(|| {
            info!(star = %self.name, "fetching time series from archive");
            Ok(self.archive_client().timeseries(&self.name)?)
        })
    }

    /// Instrument keys present in the cached mapping, in order
    pub fn available_instruments(&self) -> StarResult<Vec<String>> {
        Ok(self
            .timeseries()?
            .instrument_names()
            .map(str::to_string)
            .collect())
    }

    /// Pipeline keys under one instrument, in order
    pub fn pipelines_of_instrument(&self, instrument: &str) -> StarResult<Vec<String>> {
        let pipelines = self
            .timeseries()?
            .instrument(instrument)
            .ok_or_else(|| StarError::UnknownInstrument(instrument.to_string()))?;
        Ok(pipelines.keys().cloned().collect())
    }

    /// Observation-mode keys under one instrument and pipeline, in order
    ///
    /// Both keys are validated against the available key lists before
    /// indexing.
    pub fn observation_modes(&self, instrument: &str, pipeline: &str) -> StarResult<Vec<String>> {
        let series = self.timeseries()?;
        let pipelines = series
            .instrument(instrument)
            .ok_or_else(|| StarError::UnknownInstrument(instrument.to_string()))?;
        let modes = pipelines
            .get(pipeline)
            .ok_or_else(|| StarError::UnknownPipeline {
                instrument: instrument.to_string(),
                pipeline: pipeline.to_string(),
            })?;
        Ok(modes.keys().cloned().collect())
    }

    /// Traverse the cached mapping's leaves passing `filter`
    pub fn entries<'a>(
        &'a self,
        filter: &'a EntryFilter,
    ) -> StarResult<impl Iterator<Item = TimeSeriesEntry<'a>> + 'a> {
        Ok(self.timeseries()?.entries(filter))
    }

    /// Collect named metrics out of every matching leaf
    ///
    /// The result is keyed instrument → observation mode → pipeline, each
    /// leaf contributing the requested metrics. Insertion merges into
    /// whatever is already recorded at each level. A requested metric absent
    /// from a matching leaf is an error.
    pub fn header_info(&self, metrics: &[&str], filter: &EntryFilter) -> StarResult<HeaderInfo> {
        let mut info = HeaderInfo::new();

        for entry in self.timeseries()?.entries(filter) {
            let slot = info
                .entry(entry.instrument.to_string())
                .or_default()
                .entry(entry.mode.to_string())
                .or_default()
                .entry(entry.pipeline.to_string())
                .or_default();

            for &metric in metrics {
                let value = entry.metric(metric).ok_or_else(|| StarError::UnknownMetric {
                    metric: metric.to_string(),
                    instrument: entry.instrument.to_string(),
                    pipeline: entry.pipeline.to_string(),
                    mode: entry.mode.to_string(),
                })?;
                slot.insert(metric.to_string(), value.clone());
            }
        }

        Ok(info)
    }

    /// Timestamps, radial velocities and their errors for matching leaves
    pub fn radial_velocities(&self, filter: &EntryFilter) -> StarResult<HeaderInfo> {
        self.header_info(&RV_METRICS, filter)
    }

    /// Collect metrics across all observation modes of one instrument
    ///
    /// The pipeline is resolved via [`Star::resolve_pipeline`] and matched
    /// by name containment against the instrument's pipelines; each
    /// requested metric accumulates one value per matching leaf.
    pub fn metrics_of_instrument(
        &self,
        instrument: &str,
        metrics: &[&str],
    ) -> StarResult<BTreeMap<String, Vec<MetricValue>>> {
        let series = self.timeseries()?;
        let pipelines = series
            .instrument(instrument)
            .ok_or_else(|| StarError::UnknownInstrument(instrument.to_string()))?;
        let pipe_kw = self.resolve_pipeline(instrument)?;

        let mut collected: BTreeMap<String, Vec<MetricValue>> = metrics
            .iter()
            .map(|metric| (metric.to_string(), Vec::new()))
            .collect();

        for (pipeline_name, modes) in pipelines {
            // the ESPRESSO mode names also occur inside pipeline names, so
            // match on the resolved identifier rather than taking everything
            if !pipeline_name.contains(&pipe_kw) {
                continue;
            }

            for (mode_name, leaf) in modes {
                for &metric in metrics {
                    let value = leaf.get(metric).ok_or_else(|| StarError::UnknownMetric {
                        metric: metric.to_string(),
                        instrument: instrument.to_string(),
                        pipeline: pipeline_name.clone(),
                        mode: mode_name.clone(),
                    })?;
                    collected
                        .entry(metric.to_string())
                        .or_default()
                        .push(value.clone());
                }
            }
        }

        Ok(collected)
    }

    /// Decide which pipeline identifier to use for an instrument
    ///
    /// In order: a lone pipeline wins outright; a construction-time hint for
    /// this instrument wins next (a hint mapping that does not cover the
    /// instrument only warns); then the family default table; otherwise the
    /// resolution fails.
    pub fn resolve_pipeline(&self, instrument: &str) -> StarResult<String> {
        let mut available = self.pipelines_of_instrument(instrument)?;
        if available.len() == 1 {
            return Ok(available.remove(0));
        }

        if !self.pipeline_hints.is_empty() {
            if let Some(hint) = self.pipeline_hints.get(instrument) {
                return Ok(hint.clone());
            }
            warn!(
                instrument,
                "pipeline hints were provided but do not specify one for this instrument"
            );
        }

        if let Some(version) = self.tables()?.default_pipeline(instrument) {
            return Ok(version.to_string());
        }

        Err(StarError::NoDefaultPipeline(instrument.to_string()))
    }

    /// Enumerate, plan and transfer the raw files matching the options
    ///
    /// Walks the matching leaves' raw-file lists, groups the files not yet
    /// on disk by destination directory, and retrieves each group from the
    /// archive as one deterministically-named compressed archive, optionally
    /// extracting and flattening it in place.
    pub fn download_data(&self, options: &DownloadOptions) -> Result<DownloadReport, DownloadError> {
        let mut filter = options.filter.clone();
        if let Some(token) = filter.instrument_token() {
            let tables = self.tables().map_err(DownloadError::StarError)?;
            if let Some(canonical) = tables.canonical_instrument(token) {
                warn!(
                    requested = token,
                    canonical, "instrument is listed under a different name in the archive; updating the filter"
                );
                filter = filter.instrument(canonical.to_string());
            }
        }

        let series = self.timeseries()?;
        let plan = plan_downloads(
            series,
            &filter,
            &options.output_dir,
            options.subfolders,
            options.force,
        )?;

        info!("launching downloads");
        let mut groups_downloaded = 0;
        for (destination, files) in &plan.groups {
            if files.is_empty() {
                warn!(
                    destination = %destination.display(),
                    "all matching files already exist in this disk location"
                );
                continue;
            }

            info!(
                count = files.len(),
                destination = %destination.display(),
                "triggering the download of a file batch"
            );
            std::fs::create_dir_all(destination).map_err(|e| {
                DownloadError::IoError(format!(
                    "failed to create {}: {e}",
                    destination.display()
                ))
            })?;

            self.archive_client().download_files(
                files,
                destination,
                options.file_type,
                DEFAULT_ARCHIVE_NAME,
            )?;

            if options.unpack {
                unpack::extract_archive(destination)?;
                if options.flatten {
                    unpack::flatten_data_files(destination, DATA_FILE_EXTENSION)?;
                }
            }
            groups_downloaded += 1;
        }

        let report = DownloadReport {
            entries_matched: plan.entries_matched,
            files_requested: plan.files_requested(),
            files_skipped: plan.files_skipped,
            groups_downloaded,
        };
        info!(entries = report.entries_matched, "processed matching time-series entries");
        Ok(report)
    }

    /// Two-character spectral class of this star, from the catalog
    pub fn spectral_type(&self) -> StarResult<String> {
        let raw = self.catalog_client().spectral_type(&self.name)?;
        Ok(parse_spectral_class(&raw))
    }

    /// Every identifier the catalog knows this star under
    pub fn aliases(&self) -> StarResult<Vec<String>> {
        Ok(self.catalog_client().object_identifiers(&self.name)?)
    }
}

impl fmt::Debug for Star {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Star")
            .field("name", &self.name)
            .field("pipeline_hints", &self.pipeline_hints)
            .field("api_user", &self.api_user)
            .field("cached", &self.timeseries.get().is_some())
            .finish()
    }
}

impl fmt::Display for Star {
    /// The star's name, plus the cached key tree when one is present
    ///
    /// Display never triggers a fetch; an unfetched star prints only its
    /// name.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        let Some(series) = self.timeseries.get() else {
            return Ok(());
        };

        for instrument in series.instrument_names() {
            writeln!(f, "  {instrument}")?;
            if let Some(pipelines) = series.instrument(instrument) {
                for (pipeline, modes) in pipelines {
                    writeln!(f, "    {pipeline}")?;
                    for mode in modes.keys() {
                        writeln!(f, "      {mode}")?;
                    }
                }
            }
        }
        Ok(())
    }
}
