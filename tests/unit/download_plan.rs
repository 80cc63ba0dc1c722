use spectra_data_downloader::download::{plan_downloads, DownloadError};
use spectra_data_downloader::timeseries::{EntryFilter, MetricMap, MetricValue, TimeSeries};
use tempfile::TempDir;

fn series_with_raw_files(files: &[&str]) -> TimeSeries {
    let mut metrics = MetricMap::new();
    metrics.insert(
        "raw_file".to_string(),
        MetricValue::Texts(files.iter().map(|f| f.to_string()).collect()),
    );
    let mut series = TimeSeries::new();
    series.insert_observation("HARPN", "1.0", "HR", metrics);
    series
}

#[test]
fn test_plan_is_idempotent_against_existing_stems() {
    let series = series_with_raw_files(&["HARPN/1.0/HR/a.fits", "HARPN/1.0/HR/b.fits"]);
    let out = TempDir::new().unwrap();
    let dest = out.path().join("HARPN").join("1.0");
    std::fs::create_dir_all(&dest).unwrap();
    // the stem matches even though the on-disk name carries extra suffixes
    std::fs::write(dest.join("a.fits.gz"), b"").unwrap();

    let plan = plan_downloads(&series, &EntryFilter::new(), out.path(), true, false).unwrap();
    assert_eq!(plan.groups[&dest], vec!["HARPN/1.0/HR/b.fits".to_string()]);
    assert_eq!(plan.files_skipped, 1);
}

#[test]
fn test_force_overrides_the_idempotency_check() {
    let series = series_with_raw_files(&["HARPN/1.0/HR/a.fits"]);
    let out = TempDir::new().unwrap();
    let dest = out.path().join("HARPN").join("1.0");
    std::fs::create_dir_all(&dest).unwrap();
    std::fs::write(dest.join("a.fits"), b"").unwrap();

    let plan = plan_downloads(&series, &EntryFilter::new(), out.path(), true, true).unwrap();
    assert_eq!(plan.groups[&dest].len(), 1);
    assert_eq!(plan.files_skipped, 0);
}

#[test]
fn test_plan_without_subfolders_uses_one_group() {
    let mut series = series_with_raw_files(&["HARPN/1.0/HR/a.fits"]);
    let mut metrics = MetricMap::new();
    metrics.insert(
        "raw_file".to_string(),
        MetricValue::Texts(vec!["ESPRESSO/3.0.0/HR11/c.fits".to_string()]),
    );
    series.insert_observation("ESPRESSO", "3.0.0", "HR11", metrics);

    let out = TempDir::new().unwrap();
    let plan = plan_downloads(&series, &EntryFilter::new(), out.path(), false, false).unwrap();

    assert_eq!(plan.groups.len(), 1);
    assert_eq!(plan.groups[&out.path().to_path_buf()].len(), 2);
}

#[test]
fn test_malformed_remote_path_is_fatal() {
    let series = series_with_raw_files(&["orphan.fits"]);
    let out = TempDir::new().unwrap();

    let result = plan_downloads(&series, &EntryFilter::new(), out.path(), true, false);
    assert!(matches!(
        result,
        Err(DownloadError::MalformedRemotePath(_))
    ));
}
