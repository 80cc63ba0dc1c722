//! Archive extraction and directory flattening
//!
//! The archive client leaves one gzipped tar per destination directory.
//! Extraction unpacks it in place; flattening then moves the extracted data
//! files out of the archive's internal directory layout up into the
//! destination root and removes the emptied directories.

use super::{DownloadError, DownloadResult};
use flate2::read::GzDecoder;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const ARCHIVE_SUFFIX: &str = ".tar.gz";

/// Extract the one downloaded archive sitting in `dir`
///
/// Exactly one `.tar.gz` must be present; zero or more than one means the
/// destination is in a state this layer cannot interpret, and is fatal.
/// Returns the path of the extracted archive, which is left in place.
pub fn extract_archive(dir: &Path) -> DownloadResult<PathBuf> {
    let mut archives = Vec::new();
    let entries = std::fs::read_dir(dir)
        .map_err(|e| DownloadError::IoError(format!("failed to read {}: {e}", dir.display())))?;

    for entry in entries {
        let entry = entry
            .map_err(|e| DownloadError::IoError(format!("failed to read directory entry: {e}")))?;
        let path = entry.path();
        if path.is_file()
            && path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with(ARCHIVE_SUFFIX))
        {
            archives.push(path);
        }
    }

    if archives.len() != 1 {
        return Err(DownloadError::ArchiveCount {
            dir: dir.display().to_string(),
            found: archives.len(),
        });
    }

    let archive_path = archives.remove(0);
    debug!(path = %archive_path.display(), "extracting archive");

    let file = File::open(&archive_path).map_err(|e| {
        DownloadError::IoError(format!("failed to open {}: {e}", archive_path.display()))
    })?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    archive.unpack(dir).map_err(|e| {
        DownloadError::ExtractionError(format!(
            "failed to extract {}: {e}",
            archive_path.display()
        ))
    })?;

    Ok(archive_path)
}

/// Move extracted data files up into `dir` and drop the emptied layout
///
/// Every file with the given extension found under the extracted
/// subdirectories is moved to the destination root; the subdirectories must
/// be empty afterwards and are removed. Returns the number of moved files.
pub fn flatten_data_files(dir: &Path, extension: &str) -> DownloadResult<usize> {
    let subdirs = immediate_subdirs(dir)?;

    let mut moved = 0;
    for subdir in &subdirs {
        let mut files = Vec::new();
        collect_files_with_extension(subdir, extension, &mut files)?;

        for file in files {
            let Some(name) = file.file_name() else {
                continue;
            };
            let target = dir.join(name);
            std::fs::rename(&file, &target).map_err(|e| {
                DownloadError::IoError(format!(
                    "failed to move {} to {}: {e}",
                    file.display(),
                    target.display()
                ))
            })?;
            moved += 1;
        }
    }

    for subdir in &subdirs {
        remove_empty_tree(subdir)?;
    }

    info!(moved, root = %dir.display(), "flattened extracted files");
    Ok(moved)
}

fn immediate_subdirs(dir: &Path) -> DownloadResult<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| DownloadError::IoError(format!("failed to read {}: {e}", dir.display())))?;

    let mut subdirs = Vec::new();
    for entry in entries {
        let entry = entry
            .map_err(|e| DownloadError::IoError(format!("failed to read directory entry: {e}")))?;
        let path = entry.path();
        if path.is_dir() {
            subdirs.push(path);
        }
    }
    subdirs.sort();
    Ok(subdirs)
}

fn collect_files_with_extension(
    dir: &Path,
    extension: &str,
    out: &mut Vec<PathBuf>,
) -> DownloadResult<()> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| DownloadError::IoError(format!("failed to read {}: {e}", dir.display())))?;

    for entry in entries {
        let entry = entry
            .map_err(|e| DownloadError::IoError(format!("failed to read directory entry: {e}")))?;
        let path = entry.path();
        if path.is_dir() {
            collect_files_with_extension(&path, extension, out)?;
        } else if path.extension().is_some_and(|ext| ext == extension) {
            out.push(path);
        }
    }
    Ok(())
}

/// Remove a directory tree that is expected to hold no files
///
/// Anything left behind (a file the flatten pass did not claim) makes the
/// removal fail, which is surfaced rather than guessed around.
fn remove_empty_tree(dir: &Path) -> DownloadResult<()> {
    for subdir in immediate_subdirs(dir)? {
        remove_empty_tree(&subdir)?;
    }
    std::fs::remove_dir(dir).map_err(|e| {
        DownloadError::IoError(format!(
            "failed to remove extracted directory {}: {e}",
            dir.display()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tempfile::TempDir;

    /// Build a tar.gz holding the given (path, contents) pairs
    fn write_archive(path: &Path, files: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = tar::Builder::new(encoder);

        for (name, contents) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(contents.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, *contents).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn test_extract_then_flatten() {
        let dir = TempDir::new().unwrap();
        write_archive(
            &dir.path().join("result.tar.gz"),
            &[
                ("HARPN/2.3.5/a.fits", b"spectrum a"),
                ("HARPN/2.3.5/b.fits", b"spectrum b"),
            ],
        );

        extract_archive(dir.path()).unwrap();
        assert!(dir.path().join("HARPN/2.3.5/a.fits").exists());

        let moved = flatten_data_files(dir.path(), "fits").unwrap();
        assert_eq!(moved, 2);
        assert!(dir.path().join("a.fits").exists());
        assert!(dir.path().join("b.fits").exists());
        assert!(!dir.path().join("HARPN").exists());
        // the transferred archive itself stays put
        assert!(dir.path().join("result.tar.gz").exists());
    }

    #[test]
    fn test_extract_requires_exactly_one_archive() {
        let dir = TempDir::new().unwrap();

        let err = extract_archive(dir.path()).unwrap_err();
        assert!(matches!(err, DownloadError::ArchiveCount { found: 0, .. }));

        write_archive(&dir.path().join("one.tar.gz"), &[("x/y/a.fits", b"a")]);
        write_archive(&dir.path().join("two.tar.gz"), &[("x/y/b.fits", b"b")]);
        let err = extract_archive(dir.path()).unwrap_err();
        assert!(matches!(err, DownloadError::ArchiveCount { found: 2, .. }));
    }

    #[test]
    fn test_flatten_leaves_root_files_alone() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("already.fits"), b"keep").unwrap();
        std::fs::create_dir_all(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/new.fits"), b"move").unwrap();

        let moved = flatten_data_files(dir.path(), "fits").unwrap();
        assert_eq!(moved, 1);
        assert!(dir.path().join("already.fits").exists());
        assert!(dir.path().join("new.fits").exists());
        assert!(!dir.path().join("sub").exists());
    }

    #[test]
    fn test_flatten_fails_on_leftover_files() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/readme.txt"), b"not a spectrum").unwrap();

        assert!(flatten_data_files(dir.path(), "fits").is_err());
    }
}
