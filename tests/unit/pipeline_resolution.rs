use spectra_data_downloader::archive::{ArchiveResult, FileType, SpectroscopyArchive};
use spectra_data_downloader::timeseries::{MetricMap, TimeSeries};
use spectra_data_downloader::Star;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Archive stub serving a canned mapping
struct StubArchive {
    series: TimeSeries,
}

impl SpectroscopyArchive for StubArchive {
    fn timeseries(&self, _target: &str) -> ArchiveResult<TimeSeries> {
        Ok(self.series.clone())
    }

    fn download_files(
        &self,
        _files: &[String],
        output_directory: &Path,
        _file_type: FileType,
        output_filename: &str,
    ) -> ArchiveResult<PathBuf> {
        Ok(output_directory.join(output_filename))
    }
}

fn star_with_pipelines(instrument: &str, pipelines: &[&str]) -> Star {
    let mut series = TimeSeries::new();
    for pipeline in pipelines {
        series.insert_observation(instrument, *pipeline, "HR", MetricMap::new());
    }
    Star::new("HD 1461").with_archive_client(Box::new(StubArchive { series }))
}

fn hints(instrument: &str, pipeline: &str) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    map.insert(instrument.to_string(), pipeline.to_string());
    map
}

#[test]
fn test_single_pipeline_wins_regardless_of_hints() {
    let star = star_with_pipelines("HARPN", &["1.1.1"]);
    assert_eq!(star.resolve_pipeline("HARPN").unwrap(), "1.1.1");

    let mut series = TimeSeries::new();
    series.insert_observation("HARPN", "1.1.1", "HR", MetricMap::new());
    let star = Star::new("HD 1461")
        .with_archive_client(Box::new(StubArchive { series }))
        .with_pipeline_hints(hints("HARPN", "9.9.9"));
    assert_eq!(star.resolve_pipeline("HARPN").unwrap(), "1.1.1");
}

#[test]
fn test_hint_resolves_ambiguous_instrument() {
    let mut series = TimeSeries::new();
    series.insert_observation("HARPN", "1.1.1", "HR", MetricMap::new());
    series.insert_observation("HARPN", "2.3.5", "HR", MetricMap::new());
    let star = Star::new("HD 1461")
        .with_archive_client(Box::new(StubArchive { series }))
        .with_pipeline_hints(hints("HARPN", "1.1.1"));

    assert_eq!(star.resolve_pipeline("HARPN").unwrap(), "1.1.1");
}

#[test]
fn test_espresso_family_default_version() {
    let star = star_with_pipelines("ESPRESSO18", &["2.2.8", "3.0.0"]);
    assert_eq!(star.resolve_pipeline("ESPRESSO18").unwrap(), "3.0.0");
}
