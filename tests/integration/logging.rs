//! Integration tests for logging and tracing

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[test]
fn test_tracing_subscriber_initialization() {
    // Using try_init to avoid error if already initialized
    let result = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("spectra_data_downloader=debug")),
        )
        .with_test_writer()
        .try_init();

    // Either succeeds or fails because already initialized (both are OK)
    assert!(result.is_ok() || result.is_err());
}

#[test]
fn test_tracing_with_different_log_levels() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("spectra_data_downloader=trace"))
        .with_test_writer()
        .try_init();

    info!("This is an info message");
    warn!("This is a warning message");
    error!("This is an error message");
}

#[test]
fn test_tracing_json_format() {
    let result = tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::new("spectra_data_downloader=info"))
        .with_test_writer()
        .try_init();

    assert!(result.is_ok() || result.is_err());
}
