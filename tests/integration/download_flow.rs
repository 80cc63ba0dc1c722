//! End-to-end download flow against a tar-producing archive stub
//!
//! Exercises the full chain: filtered traversal, destination grouping,
//! batched transfer, in-place extraction and flattening.

use flate2::write::GzEncoder;
use flate2::Compression;
use spectra_data_downloader::archive::{ArchiveResult, FileType, SpectroscopyArchive};
use spectra_data_downloader::timeseries::{EntryFilter, MetricMap, MetricValue, TimeSeries};
use spectra_data_downloader::{DownloadOptions, Star};
use std::fs::File;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Archive stub that materializes each requested batch as a real tar.gz
struct TarArchive {
    series: TimeSeries,
}

impl SpectroscopyArchive for TarArchive {
    fn timeseries(&self, _target: &str) -> ArchiveResult<TimeSeries> {
        Ok(self.series.clone())
    }

    fn download_files(
        &self,
        files: &[String],
        output_directory: &Path,
        _file_type: FileType,
        output_filename: &str,
    ) -> ArchiveResult<PathBuf> {
        let archive_path = output_directory.join(output_filename);
        let file = File::create(&archive_path).expect("create archive");
        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = tar::Builder::new(encoder);

        for remote in files {
            let contents = format!("spectrum {remote}");
            let mut header = tar::Header::new_gnu();
            header.set_size(contents.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, remote, contents.as_bytes())
                .expect("append entry");
        }
        builder
            .into_inner()
            .expect("finish tar")
            .finish()
            .expect("finish gzip");
        Ok(archive_path)
    }
}

fn harpn_series() -> TimeSeries {
    let mut metrics = MetricMap::new();
    metrics.insert(
        "raw_file".to_string(),
        MetricValue::Texts(vec![
            "HARPN/1.0/HR/a.fits".to_string(),
            "HARPN/1.0/HR/b.fits".to_string(),
        ]),
    );
    let mut series = TimeSeries::new();
    series.insert_observation("HARPN", "1.0", "HR", metrics);
    series
}

fn star(series: TimeSeries) -> Star {
    Star::new("HD 189733").with_archive_client(Box::new(TarArchive { series }))
}

#[test]
fn test_download_unpack_and_flatten_into_subfolders() {
    let out = TempDir::new().unwrap();
    let star = star(harpn_series());

    let report = star
        .download_data(&DownloadOptions::new(out.path()))
        .unwrap();

    assert_eq!(report.entries_matched, 1);
    assert_eq!(report.files_requested, 2);
    assert_eq!(report.groups_downloaded, 1);

    // one destination group, divided by instrument and pipeline
    let dest = out.path().join("HARPN").join("1.0");
    assert!(dest.join("a.fits").exists());
    assert!(dest.join("b.fits").exists());
    // the archive's internal layout is gone, the archive itself remains
    assert!(!dest.join("HARPN").exists());
    assert!(dest.join("result.tar.gz").exists());
}

#[test]
fn test_second_invocation_downloads_nothing() {
    let out = TempDir::new().unwrap();
    let star = star(harpn_series());
    let options = DownloadOptions::new(out.path());

    let first = star.download_data(&options).unwrap();
    assert_eq!(first.files_requested, 2);

    let second = star.download_data(&options).unwrap();
    assert_eq!(second.files_requested, 0);
    assert_eq!(second.files_skipped, 2);
    assert_eq!(second.groups_downloaded, 0);
}

#[test]
fn test_forced_invocation_downloads_again() {
    let out = TempDir::new().unwrap();
    let star = star(harpn_series());

    star.download_data(&DownloadOptions::new(out.path())).unwrap();
    let forced = star
        .download_data(&DownloadOptions::new(out.path()).with_force(true))
        .unwrap();

    assert_eq!(forced.files_requested, 2);
    assert_eq!(forced.groups_downloaded, 1);
}

#[test]
fn test_unpack_disabled_leaves_the_archive_packed() {
    let out = TempDir::new().unwrap();
    let star = star(harpn_series());

    star.download_data(&DownloadOptions::new(out.path()).with_unpack(false))
        .unwrap();

    let dest = out.path().join("HARPN").join("1.0");
    assert!(dest.join("result.tar.gz").exists());
    assert!(!dest.join("a.fits").exists());
}

#[test]
fn test_flatten_disabled_keeps_the_archive_layout() {
    let out = TempDir::new().unwrap();
    let star = star(harpn_series());

    star.download_data(&DownloadOptions::new(out.path()).with_flatten(false))
        .unwrap();

    let dest = out.path().join("HARPN").join("1.0");
    assert!(dest.join("HARPN/1.0/HR/a.fits").exists());
    assert!(!dest.join("a.fits").exists());
}

#[test]
fn test_mode_filter_excludes_everything_else() {
    let mut series = harpn_series();
    let mut metrics = MetricMap::new();
    metrics.insert(
        "raw_file".to_string(),
        MetricValue::Texts(vec!["HARPN/1.0/EGGS/e.fits".to_string()]),
    );
    series.insert_observation("HARPN", "1.0", "EGGS", metrics);

    let out = TempDir::new().unwrap();
    let star = star(series);

    let report = star
        .download_data(
            &DownloadOptions::new(out.path())
                .with_filter(EntryFilter::new().mode("EGGS")),
        )
        .unwrap();

    assert_eq!(report.entries_matched, 1);
    assert_eq!(report.files_requested, 1);
    let dest = out.path().join("HARPN").join("1.0");
    assert!(dest.join("e.fits").exists());
    assert!(!dest.join("a.fits").exists());
}
