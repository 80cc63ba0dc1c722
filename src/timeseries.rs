//! Nested time-series mapping and its traversal primitive
//!
//! The archive groups spectroscopic observations three levels deep:
//! instrument, then reduction pipeline, then observation mode. Every leaf is
//! a bag of named metrics (radial velocity, its error, timestamps, raw file
//! paths, ...). [`TimeSeries`] models that shape and [`TimeSeries::entries`]
//! is the single lazy traversal all read operations are built on.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metrics attached to one instrument/pipeline/mode leaf
pub type MetricMap = BTreeMap<String, MetricValue>;

/// Observation modes under one pipeline
pub type ModeMap = BTreeMap<String, MetricMap>;

/// Pipelines under one instrument
pub type PipelineMap = BTreeMap<String, ModeMap>;

/// Offset between a reduced Julian date and a plain Julian date
const RJD_OFFSET: f64 = 2_400_000.0;

/// Unix epoch expressed as a Julian date
const UNIX_EPOCH_JD: f64 = 2_440_587.5;

/// A metric value as returned by the archive: a scalar or a sequence
///
/// The archive reports most metrics as per-observation sequences (one entry
/// per exposure) but scalars do occur, so both shapes are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    /// A single numeric value
    Number(f64),
    /// A single text value
    Text(String),
    /// A sequence of numeric values, one per observation
    Numbers(Vec<f64>),
    /// A sequence of text values, one per observation
    Texts(Vec<String>),
}

impl MetricValue {
    /// Scalar numeric value, if this is one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Scalar text value, if this is one
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetricValue::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Numeric sequence, treating a scalar as a one-element sequence
    pub fn to_number_series(&self) -> Option<Vec<f64>> {
        match self {
            MetricValue::Number(v) => Some(vec![*v]),
            MetricValue::Numbers(v) => Some(v.clone()),
            _ => None,
        }
    }

    /// Text sequence, if this is one
    pub fn as_text_list(&self) -> Option<&[String]> {
        match self {
            MetricValue::Texts(v) => Some(v),
            _ => None,
        }
    }
}

/// One leaf of the nested mapping, borrowed from a [`TimeSeries`]
#[derive(Debug, Clone, Copy)]
pub struct TimeSeriesEntry<'a> {
    /// Instrument key
    pub instrument: &'a str,
    /// Pipeline key
    pub pipeline: &'a str,
    /// Observation-mode key
    pub mode: &'a str,
    /// The leaf's full metric mapping
    pub metrics: &'a MetricMap,
}

impl<'a> TimeSeriesEntry<'a> {
    /// Look up one named metric in this leaf
    pub fn metric(&self, name: &str) -> Option<&'a MetricValue> {
        self.metrics.get(name)
    }
}

/// Key filters for [`TimeSeries::entries`]
///
/// Each level accepts a key when its token is absent, or when the key equals
/// or contains the token. The predicates run before descending, so rejected
/// instruments and pipelines are never expanded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFilter {
    instrument: Option<String>,
    pipeline: Option<String>,
    mode: Option<String>,
}

impl EntryFilter {
    /// Filter accepting every entry
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to instruments whose key contains `token`
    pub fn instrument(mut self, token: impl Into<String>) -> Self {
        self.instrument = Some(token.into());
        self
    }

    /// Restrict to pipelines whose key contains `token`
    pub fn pipeline(mut self, token: impl Into<String>) -> Self {
        self.pipeline = Some(token.into());
        self
    }

    /// Restrict to observation modes whose key contains `token`
    pub fn mode(mut self, token: impl Into<String>) -> Self {
        self.mode = Some(token.into());
        self
    }

    /// The instrument token, if any
    pub fn instrument_token(&self) -> Option<&str> {
        self.instrument.as_deref()
    }

    /// The pipeline token, if any
    pub fn pipeline_token(&self) -> Option<&str> {
        self.pipeline.as_deref()
    }

    /// The observation-mode token, if any
    pub fn mode_token(&self) -> Option<&str> {
        self.mode.as_deref()
    }

    fn accepts(token: &Option<String>, key: &str) -> bool {
        token.as_deref().is_none_or(|t| key.contains(t))
    }

    /// Does this instrument key pass the filter?
    pub fn matches_instrument(&self, key: &str) -> bool {
        Self::accepts(&self.instrument, key)
    }

    /// Does this pipeline key pass the filter?
    pub fn matches_pipeline(&self, key: &str) -> bool {
        Self::accepts(&self.pipeline, key)
    }

    /// Does this observation-mode key pass the filter?
    pub fn matches_mode(&self, key: &str) -> bool {
        Self::accepts(&self.mode, key)
    }
}

/// The nested instrument → pipeline → mode → metrics mapping for one target
///
/// Deserialized straight from the archive's metadata payload. Keys iterate
/// in sorted order, so every derived view is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeSeries {
    instruments: BTreeMap<String, PipelineMap>,
}

impl TimeSeries {
    /// Empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no instrument is present
    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    /// Instrument keys, in order
    pub fn instrument_names(&self) -> impl Iterator<Item = &str> {
        self.instruments.keys().map(String::as_str)
    }

    /// The pipeline mapping of one instrument
    pub fn instrument(&self, name: &str) -> Option<&PipelineMap> {
        self.instruments.get(name)
    }

    /// Insert one leaf, creating intermediate levels as needed
    ///
    /// Mostly useful for building fixtures; real mappings come from the
    /// archive payload via serde.
    pub fn insert_observation(
        &mut self,
        instrument: impl Into<String>,
        pipeline: impl Into<String>,
        mode: impl Into<String>,
        metrics: MetricMap,
    ) {
        self.instruments
            .entry(instrument.into())
            .or_default()
            .entry(pipeline.into())
            .or_default()
            .insert(mode.into(), metrics);
    }

    /// Depth-first traversal of every leaf passing `filter`
    ///
    /// This is the one traversal primitive: each filter level is a cheap
    /// reject-predicate applied before descending, and the iterator is lazy
    /// and restartable per call.
    pub fn entries<'a>(
        &'a self,
        filter: &'a EntryFilter,
    ) -> impl Iterator<Item = TimeSeriesEntry<'a>> + 'a {
        self.instruments
            .iter()
            .filter(move |(name, _)| filter.matches_instrument(name.as_str()))
            .flat_map(move |(instrument, pipelines)| {
                pipelines
                    .iter()
                    .filter(move |(name, _)| filter.matches_pipeline(name.as_str()))
                    .flat_map(move |(pipeline, modes)| {
                        modes
                            .iter()
                            .filter(move |(name, _)| filter.matches_mode(name.as_str()))
                            .map(move |(mode, metrics)| TimeSeriesEntry {
                                instrument: instrument.as_str(),
                                pipeline: pipeline.as_str(),
                                mode: mode.as_str(),
                                metrics,
                            })
                    })
            })
    }
}

/// Convert a reduced Julian date (JD − 2400000) to a UTC timestamp
///
/// Returns `None` for values that fall outside the representable range.
pub fn rjd_to_utc(rjd: f64) -> Option<DateTime<Utc>> {
    let jd = rjd + RJD_OFFSET;
    let unix_millis = (jd - UNIX_EPOCH_JD) * 86_400_000.0;
    if !unix_millis.is_finite() || unix_millis.abs() > i64::MAX as f64 {
        return None;
    }
    Utc.timestamp_millis_opt(unix_millis as i64).single()
}
