//! SIMBAD TAP catalog client
//!
//! Queries the SIMBAD TAP synchronous endpoint with ADQL and decodes the
//! JSON table responses. Only the two lookups this layer needs are exposed.

use super::{CatalogError, CatalogResult, CatalogService};
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

const SIMBAD_TAP_URL: &str = "https://simbad.cds.unistra.fr/simbad/sim-tap/sync";

/// TAP JSON table response: column metadata plus a row-major data matrix
#[derive(Debug, Deserialize)]
struct TapResponse {
    data: Vec<Vec<serde_json::Value>>,
}

/// HTTP client for the SIMBAD catalog
pub struct SimbadClient {
    client: Client,
    base_url: String,
}

impl SimbadClient {
    /// Create a client against the public catalog
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: SIMBAD_TAP_URL.to_string(),
        }
    }

    /// Create with custom base URL (for testing)
    pub fn new_with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Run one synchronous ADQL query
    fn query(&self, adql: &str) -> CatalogResult<TapResponse> {
        debug!(%adql, "querying catalog");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("request", "doQuery"),
                ("lang", "adql"),
                ("format", "json"),
                ("query", adql),
            ])
            .send()
            .map_err(|e| CatalogError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::HttpError(format!(
                "catalog query failed: HTTP {status}"
            )));
        }

        let body = response
            .text()
            .map_err(|e| CatalogError::NetworkError(e.to_string()))?;
        Self::parse_response(&body)
    }

    pub(crate) fn parse_response(body: &str) -> CatalogResult<TapResponse> {
        serde_json::from_str(body)
            .map_err(|e| CatalogError::ParseError(format!("failed to parse catalog reply: {e}")))
    }

    /// Quote a literal for embedding in ADQL
    fn quote(name: &str) -> String {
        name.replace('\'', "''")
    }
}

impl Default for SimbadClient {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogService for SimbadClient {
    fn spectral_type(&self, object_name: &str) -> CatalogResult<String> {
        let adql = format!(
            "SELECT basic.sp_type FROM basic \
             JOIN ident ON ident.oidref = basic.oid \
             WHERE ident.id = '{}'",
            Self::quote(object_name)
        );

        let table = self.query(&adql)?;
        let row = table
            .data
            .first()
            .ok_or_else(|| CatalogError::ObjectNotFound(object_name.to_string()))?;

        Ok(row
            .first()
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string())
    }

    fn object_identifiers(&self, object_name: &str) -> CatalogResult<Vec<String>> {
        let adql = format!(
            "SELECT id2.id FROM ident AS id1 \
             JOIN ident AS id2 ON id1.oidref = id2.oidref \
             WHERE id1.id = '{}'",
            Self::quote(object_name)
        );

        let table = self.query(&adql)?;
        if table.data.is_empty() {
            return Err(CatalogError::ObjectNotFound(object_name.to_string()));
        }

        Ok(table
            .data
            .iter()
            .filter_map(|row| row.first())
            .filter_map(|v| v.as_str())
            .map(str::to_string)
            .collect())
    }
}
