//! DACE HTTP archive client
//!
//! Blocking client for the two archive calls this layer needs: the
//! per-target time-series metadata fetch and the batched file transfer. The
//! API key is resolved per request so a profile override set after
//! construction still applies to the first call that needs it.

use super::credentials::CredentialStore;
use super::{ArchiveError, ArchiveResult, FileType, SpectroscopyArchive};
use crate::timeseries::TimeSeries;
use reqwest::blocking::Client;
use serde_json::json;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const DACE_BASE_URL: &str = "https://dace-api.unige.ch";
const TIMESERIES_ENDPOINT: &str = "/spectroscopy/timeseries";
const DOWNLOAD_ENDPOINT: &str = "/spectroscopy/download";

/// HTTP client for the DACE spectroscopy archive
pub struct DaceArchiveClient {
    client: Client,
    base_url: String,
    credentials: CredentialStore,
    profile: Option<String>,
}

impl DaceArchiveClient {
    /// Create a client against the public archive
    ///
    /// A credential file that fails to load is demoted to anonymous access
    /// with a warning; the archive serves public data without a key.
    pub fn new() -> Self {
        let credentials = CredentialStore::load_default().unwrap_or_else(|e| {
            warn!("failed to load credential store: {e}");
            CredentialStore::default()
        });

        Self {
            client: Client::new(),
            base_url: DACE_BASE_URL.to_string(),
            credentials,
            profile: None,
        }
    }

    /// Create with custom base URL (for testing)
    pub fn new_with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::new()
        }
    }

    /// Select a named credential profile instead of the default identity
    pub fn with_profile(mut self, profile: Option<String>) -> Self {
        self.profile = profile;
        self
    }

    /// Replace the credential store
    pub fn with_credentials(mut self, credentials: CredentialStore) -> Self {
        self.credentials = credentials;
        self
    }

    /// Resolve the API key for the active identity
    ///
    /// A named profile must exist in the store; the default identity may be
    /// anonymous.
    fn api_key(&self) -> ArchiveResult<Option<String>> {
        match &self.profile {
            Some(profile) => self
                .credentials
                .api_key(profile)
                .map(|k| Some(k.to_string()))
                .ok_or_else(|| {
                    ArchiveError::CredentialError(format!(
                        "no API key stored for profile {profile}"
                    ))
                }),
            None => Ok(self.credentials.default_api_key()),
        }
    }

    fn authorize(
        &self,
        request: reqwest::blocking::RequestBuilder,
    ) -> ArchiveResult<reqwest::blocking::RequestBuilder> {
        Ok(match self.api_key()? {
            Some(key) => request.header("Authorization", key),
            None => request,
        })
    }

    /// Decode the metadata payload into the nested mapping
    pub(crate) fn parse_timeseries(body: &str) -> ArchiveResult<TimeSeries> {
        serde_json::from_str(body)
            .map_err(|e| ArchiveError::ParseError(format!("failed to parse time series: {e}")))
    }
}

impl Default for DaceArchiveClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SpectroscopyArchive for DaceArchiveClient {
    fn timeseries(&self, target: &str) -> ArchiveResult<TimeSeries> {
        let url = format!("{}{}", self.base_url, TIMESERIES_ENDPOINT);
        debug!(%url, star = target, "fetching time series metadata");

        let request = self
            .client
            .get(&url)
            .query(&[("target", target), ("sorted_by_instrument", "true")]);
        let response = self
            .authorize(request)?
            .send()
            .map_err(|e| ArchiveError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ArchiveError::TargetNotFound(target.to_string()));
        }
        if !status.is_success() {
            return Err(ArchiveError::HttpError(format!(
                "time series fetch failed: HTTP {status}"
            )));
        }

        let body = response
            .text()
            .map_err(|e| ArchiveError::NetworkError(e.to_string()))?;
        Self::parse_timeseries(&body)
    }

    fn download_files(
        &self,
        files: &[String],
        output_directory: &Path,
        file_type: FileType,
        output_filename: &str,
    ) -> ArchiveResult<PathBuf> {
        let url = format!("{}{}", self.base_url, DOWNLOAD_ENDPOINT);
        info!(count = files.len(), %url, "requesting file batch");

        let body = json!({
            "file_type": file_type,
            "files": files,
        });

        let request = self.client.post(&url).json(&body);
        let mut response = self
            .authorize(request)?
            .send()
            .map_err(|e| ArchiveError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArchiveError::HttpError(format!(
                "file batch download failed: HTTP {status}"
            )));
        }

        let archive_path = output_directory.join(output_filename);
        let file = File::create(&archive_path).map_err(|e| {
            ArchiveError::IoError(format!("failed to create {}: {e}", archive_path.display()))
        })?;
        let mut writer = BufWriter::new(file);
        let written = response
            .copy_to(&mut writer)
            .map_err(|e| ArchiveError::NetworkError(e.to_string()))?;

        debug!(bytes = written, path = %archive_path.display(), "wrote archive");
        Ok(archive_path)
    }
}
