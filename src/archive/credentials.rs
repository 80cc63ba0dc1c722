//! API-key credential store
//!
//! Keys live in a small JSON rc file mapping profile names to API keys:
//!
//! ```json
//! { "user": "api-key-...", "colleague": "api-key-..." }
//! ```
//!
//! The file path comes from the `DACE_RC` environment variable, falling back
//! to `$HOME/.dacerc.json`. A missing file yields an empty store (anonymous
//! archive access); an unreadable or malformed file is an error. The
//! `DACE_API_KEY` environment variable overrides the default profile's key.

use super::{ArchiveError, ArchiveResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Environment variable naming the rc file location
pub const RC_PATH_ENV: &str = "DACE_RC";

/// Environment variable overriding the default profile's key
pub const API_KEY_ENV: &str = "DACE_API_KEY";

/// Profile name used when no alternate identity is requested
pub const DEFAULT_PROFILE: &str = "user";

const RC_FILE_NAME: &str = ".dacerc.json";

/// Profile-name → API-key mapping
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialStore {
    profiles: BTreeMap<String, String>,
}

impl CredentialStore {
    /// Load from the default rc file location
    pub fn load_default() -> ArchiveResult<Self> {
        match Self::rc_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load from an explicit rc file path
    pub fn load(path: &std::path::Path) -> ArchiveResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ArchiveError::CredentialError(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_json(&contents)
    }

    /// Parse from a JSON string
    pub fn from_json(json: &str) -> ArchiveResult<Self> {
        serde_json::from_str(json).map_err(|e| {
            ArchiveError::CredentialError(format!("failed to parse credential file: {e}"))
        })
    }

    /// The rc file location: `DACE_RC`, else `$HOME/.dacerc.json`
    pub fn rc_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(RC_PATH_ENV) {
            return Some(PathBuf::from(path));
        }
        std::env::var_os("HOME").map(|home| PathBuf::from(home).join(RC_FILE_NAME))
    }

    /// Insert or replace one profile's key
    pub fn set_key(&mut self, profile: impl Into<String>, key: impl Into<String>) {
        self.profiles.insert(profile.into(), key.into());
    }

    /// The key stored for a named profile
    pub fn api_key(&self, profile: &str) -> Option<&str> {
        self.profiles.get(profile).map(String::as_str)
    }

    /// The key for the default profile, honoring the env override
    pub fn default_api_key(&self) -> Option<String> {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.is_empty() {
                return Some(key);
            }
        }
        self.api_key(DEFAULT_PROFILE).map(str::to_string)
    }
}
