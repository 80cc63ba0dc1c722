//! Destination planning and idempotency
//!
//! A remote file path embeds its archive location as
//! `instrument/pipeline/.../filename`. Planning walks the filtered leaves,
//! derives each file's destination directory from that prefix, drops files
//! whose stem already exists under the destination tree, and groups the
//! survivors so each destination becomes one batched transfer.

use super::{DownloadError, DownloadResult};
use crate::timeseries::{EntryFilter, TimeSeries};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Metric holding the remote file paths of a leaf
pub const RAW_FILE_METRIC: &str = "raw_file";

/// Suffix that delimits a data file's stem
const STEM_DELIMITER: &str = ".fits";

/// Files to transfer, grouped by destination directory
///
/// Groups whose file list is empty had every candidate already on disk;
/// they are kept so callers can report them.
#[derive(Debug, Default)]
pub struct DownloadPlan {
    /// Destination directory → remote files still to transfer
    pub groups: BTreeMap<PathBuf, Vec<String>>,
    /// Time-series leaves that matched the filter
    pub entries_matched: usize,
    /// Files dropped by the idempotency check
    pub files_skipped: usize,
}

impl DownloadPlan {
    /// Total number of files across all groups
    pub fn files_requested(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }
}

/// Group the filtered leaves' raw files by destination directory
pub fn plan_downloads(
    series: &TimeSeries,
    filter: &EntryFilter,
    output_dir: &Path,
    subfolders: bool,
    force: bool,
) -> DownloadResult<DownloadPlan> {
    let mut plan = DownloadPlan::default();

    for entry in series.entries(filter) {
        plan.entries_matched += 1;

        let files = entry
            .metric(RAW_FILE_METRIC)
            .and_then(|v| v.as_text_list())
            .ok_or_else(|| DownloadError::MissingRawFiles {
                instrument: entry.instrument.to_string(),
                pipeline: entry.pipeline.to_string(),
                mode: entry.mode.to_string(),
            })?;

        for file in files {
            let destination = destination_for(file, output_dir, subfolders)?;
            let group = plan.groups.entry(destination.clone()).or_default();

            if !force && dir_contains_stem(&destination, &file_stem_of(file)?)? {
                plan.files_skipped += 1;
                continue;
            }
            group.push(file.clone());
        }
    }

    Ok(plan)
}

/// Destination directory for one remote file
///
/// With subfoldering the instrument and pipeline names embedded in the
/// remote path become subdirectories of the output root.
pub fn destination_for(
    remote_file: &str,
    output_dir: &Path,
    subfolders: bool,
) -> DownloadResult<PathBuf> {
    if !subfolders {
        return Ok(output_dir.to_path_buf());
    }

    let mut parts = remote_file.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(instrument), Some(pipeline), Some(_)) if !instrument.is_empty() => {
            Ok(output_dir.join(instrument).join(pipeline))
        }
        _ => Err(DownloadError::MalformedRemotePath(remote_file.to_string())),
    }
}

/// The stem of a remote file: its filename up to the `.fits` suffix
pub fn file_stem_of(remote_file: &str) -> DownloadResult<String> {
    let filename = remote_file
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| DownloadError::MalformedRemotePath(remote_file.to_string()))?;

    let stem = filename.split(STEM_DELIMITER).next().unwrap_or(filename);
    Ok(stem.to_string())
}

/// Does any file under `dir` (at any depth) share this stem?
pub fn dir_contains_stem(dir: &Path, stem: &str) -> DownloadResult<bool> {
    if !dir.exists() {
        return Ok(false);
    }

    let entries = std::fs::read_dir(dir)
        .map_err(|e| DownloadError::IoError(format!("failed to read {}: {e}", dir.display())))?;

    for entry in entries {
        let entry = entry
            .map_err(|e| DownloadError::IoError(format!("failed to read directory entry: {e}")))?;
        let path = entry.path();

        if path.is_dir() {
            if dir_contains_stem(&path, stem)? {
                return Ok(true);
            }
        } else if path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(stem))
        {
            return Ok(true);
        }
    }

    Ok(false)
}
