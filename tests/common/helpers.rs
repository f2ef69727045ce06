use httpmock::prelude::*;
use httpmock::Mock;
use rand::Rng;
use std::fs;
use std::path::Path;
use std::sync::Once;
use std::time::Duration;
use tempfile::TempDir;
use stor_client::{Digest, DownloadManagerBuilder};

/// Delay used by tests exercising the retry policy.
pub const TEST_RETRY_DELAY: Duration = Duration::from_millis(20);

static TRACING: Once = Once::new();

/// Route the crate's logs to the test output, filtered by `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Creates a temporary directory for testing purposes
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temporary directory")
}

/// Creates random blob content of the given size
pub fn random_blob(size: usize) -> Vec<u8> {
    let mut data = vec![0u8; size];
    rand::rng().fill(&mut data[..]);
    data
}

/// Serves `data` under its digest and returns the mock with the digest
pub async fn serve_blob<'a>(server: &'a MockServer, data: &[u8]) -> (Digest, Mock<'a>) {
    let digest = Digest::of(data);
    let body = data.to_vec();
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path(format!("/{}", digest));
            then.status(200).body(body);
        })
        .await;
    (digest, mock)
}

/// Answers requests for `digest` with `status` and an empty body
pub async fn serve_status<'a>(server: &'a MockServer, digest: &Digest, status: u16) -> Mock<'a> {
    server
        .mock_async(|when, then| {
            when.method(GET).path(format!("/{}", digest));
            then.status(status);
        })
        .await
}

/// Builder pointed at `server`, storing into `dir`, without progress bars
pub fn test_builder(server: &MockServer, dir: &Path) -> DownloadManagerBuilder {
    init_tracing();
    DownloadManagerBuilder::hidden(server.base_url())
        .directory(dir.to_path_buf())
        .workers(4)
        .retry_delay(TEST_RETRY_DELAY)
}

/// Asserts that a file exists with exactly the given content
pub fn assert_file_content(path: &Path, expected: &[u8]) {
    let content = fs::read(path).unwrap_or_else(|e| panic!("Cannot read {:?}: {}", path, e));
    assert_eq!(content, expected, "File content mismatch at path: {:?}", path);
}

/// Asserts that no `.temp` file is left in `dir`
pub fn assert_no_temp_files(dir: &Path) {
    for entry in fs::read_dir(dir).expect("Failed to list directory") {
        let path = entry.expect("Failed to read directory entry").path();
        assert!(
            !path.to_string_lossy().ends_with(stor_client::utils::TEMP_SUFFIX),
            "Temp file left behind: {:?}",
            path
        );
    }
}
