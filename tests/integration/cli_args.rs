//! CLI argument validation
//!
//! Only the argument surface is exercised here; commands that would reach
//! the network are not run.

use assert_cmd::Command;

#[test]
fn test_help_lists_subcommands() {
    let output = Command::cargo_bin("spectra-data-downloader")
        .unwrap()
        .arg("--help")
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout).to_string();
    assert!(stdout.contains("list"));
    assert!(stdout.contains("info"));
    assert!(stdout.contains("rvs"));
    assert!(stdout.contains("download"));
}

#[test]
fn test_download_requires_an_output_directory() {
    Command::cargo_bin("spectra-data-downloader")
        .unwrap()
        .args(["download", "HD 10700"])
        .assert()
        .failure();
}

#[test]
fn test_download_rejects_unknown_file_type() {
    Command::cargo_bin("spectra-data-downloader")
        .unwrap()
        .args([
            "download",
            "HD 10700",
            "--output",
            "/tmp/spectra-cli-test",
            "--file-type",
            "png",
        ])
        .assert()
        .failure();
}

#[test]
fn test_list_requires_a_target() {
    Command::cargo_bin("spectra-data-downloader")
        .unwrap()
        .arg("list")
        .assert()
        .failure();
}
