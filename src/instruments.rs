//! Instrument fact tables
//!
//! Two pieces of archive-side domain knowledge live here rather than inline
//! in the download and pipeline-resolution code: the instrument-name aliases
//! (instruments renamed on the archive side) and the default pipeline
//! version per instrument family. Both are embedded as JSON and can be
//! overridden with [`InstrumentTables::from_json`].

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Embedded table data
const TABLES_JSON: &str = include_str!("instrument_tables.json");

/// Global tables instance (parsed once)
static TABLES: Lazy<Result<InstrumentTables, TablesError>> =
    Lazy::new(|| InstrumentTables::from_json(TABLES_JSON));

/// Instrument table errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum TablesError {
    /// Table data could not be parsed
    #[error("parse error: {0}")]
    ParseError(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawTables {
    #[allow(dead_code)]
    schema_version: String,
    aliases: BTreeMap<String, String>,
    default_pipelines: Vec<FamilyDefault>,
}

/// Default pipeline version for one instrument family
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FamilyDefault {
    family: String,
    version: String,
}

/// Archive-side instrument aliases and family pipeline defaults
#[derive(Debug, Clone)]
pub struct InstrumentTables {
    aliases: BTreeMap<String, String>,
    default_pipelines: Vec<FamilyDefault>,
}

impl InstrumentTables {
    /// The embedded tables
    ///
    /// This is a singleton operation - the tables are parsed once and cached.
    pub fn embedded() -> Result<&'static Self, &'static TablesError> {
        TABLES.as_ref()
    }

    /// Parse tables from a JSON string
    ///
    /// Use this to override the embedded facts without touching the code.
    pub fn from_json(json: &str) -> Result<Self, TablesError> {
        let raw: RawTables = serde_json::from_str(json)
            .map_err(|e| TablesError::ParseError(format!("failed to parse instrument tables: {e}")))?;

        let aliases = raw
            .aliases
            .into_iter()
            .map(|(k, v)| (k.to_ascii_uppercase(), v))
            .collect();

        Ok(Self {
            aliases,
            default_pipelines: raw.default_pipelines,
        })
    }

    /// Archive-side canonical name for an instrument, if it differs
    ///
    /// Aliases are matched case-insensitively. Returns `None` when the name
    /// is already the canonical one.
    pub fn canonical_instrument(&self, name: &str) -> Option<&str> {
        self.aliases
            .get(&name.to_ascii_uppercase())
            .map(String::as_str)
    }

    /// Default pipeline version for an instrument, by family
    ///
    /// The first family whose name is contained in the instrument name wins.
    pub fn default_pipeline(&self, instrument: &str) -> Option<&str> {
        self.default_pipelines
            .iter()
            .find(|d| instrument.contains(&d.family))
            .map(|d| d.version.as_str())
    }
}
