//! End-to-end tests running a download manager against a mock store.

use stor_client::download::{DownloadOutcome, SkipReason};
use stor_client::utils::temp_path;
use stor_client::{Digest, Summary};

use httpmock::prelude::*;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

mod common;
use common::helpers::*;

fn collect_summaries() -> (Arc<Mutex<Vec<Summary>>>, impl Fn(&Summary) + Send + Sync + 'static) {
    let summaries = Arc::new(Mutex::new(Vec::new()));
    let sink = summaries.clone();
    (summaries, move |summary: &Summary| {
        sink.lock().unwrap().push(summary.clone())
    })
}

#[tokio::test]
async fn test_download_then_skip_existing() {
    let server = MockServer::start_async().await;
    let dir = create_temp_dir();
    let data = random_blob(1024);
    let (digest, mock) = serve_blob(&server, &data).await;

    let (summaries, on_complete) = collect_summaries();
    let mut manager = test_builder(&server, dir.path())
        .on_complete(on_complete)
        .build()
        .unwrap();
    manager.start().unwrap();
    manager.submit(digest).await.unwrap();
    let total = manager.wait_for_completion().await.unwrap();

    mock.assert_async().await;
    assert_eq!(total.expected(), 1);
    assert_eq!(total.count(), 1);
    assert_eq!(total.completed(), 1);
    assert_eq!(total.size(), 1024);
    assert!(total.is_complete());

    let target = dir.path().join(digest.to_hex());
    assert_file_content(&target, &data);
    assert!(!temp_path(&target).exists());
    {
        let summaries = summaries.lock().unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].digest(), &digest);
        assert_eq!(summaries[0].path(), Some(target.as_path()));
        assert!(matches!(
            summaries[0].outcome(),
            DownloadOutcome::Completed { size: 1024, .. }
        ));
    }

    // A second run over the same directory finds the blob in place.
    let (summaries, on_complete) = collect_summaries();
    let mut manager = test_builder(&server, dir.path())
        .on_complete(on_complete)
        .build()
        .unwrap();
    manager.start().unwrap();
    manager.submit(digest).await.unwrap();
    let total = manager.wait_for_completion().await.unwrap();

    assert_eq!(mock.hits_async().await, 1);
    assert_eq!(total.skipped(), 1);
    assert_eq!(total.size(), 0);
    assert_eq!(
        summaries.lock().unwrap()[0].outcome(),
        &DownloadOutcome::Skipped(SkipReason::AlreadyPresent)
    );
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let server = MockServer::start_async().await;
    let dir = create_temp_dir();
    let digest = Digest::of(b"never stored");
    let mock = serve_status(&server, &digest, 404).await;

    let (summaries, on_complete) = collect_summaries();
    let mut manager = test_builder(&server, dir.path())
        .retry_attempts(5)
        .on_complete(on_complete)
        .build()
        .unwrap();
    manager.start().unwrap();
    manager.submit(digest).await.unwrap();
    let total = manager.wait_for_completion().await.unwrap();

    assert_eq!(mock.hits_async().await, 1);
    assert_eq!(total.failed(), 1);
    assert!(total.is_complete());
    assert!(summaries.lock().unwrap()[0].outcome().is_failed());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_server_errors_exhaust_every_attempt() {
    let server = MockServer::start_async().await;
    let dir = create_temp_dir();
    let digest = Digest::of(b"flaky");
    let mock = serve_status(&server, &digest, 500).await;

    let started = Instant::now();
    let mut manager = test_builder(&server, dir.path())
        .retry_attempts(3)
        .build()
        .unwrap();
    manager.start().unwrap();
    manager.submit(digest).await.unwrap();
    let total = manager.wait_for_completion().await.unwrap();

    assert_eq!(mock.hits_async().await, 3);
    assert_eq!(total.failed(), 1);
    assert!(started.elapsed() >= TEST_RETRY_DELAY * 2);
    assert_no_temp_files(dir.path());
}

#[tokio::test]
async fn test_unreachable_endpoint_fails_after_retries() {
    init_tracing();
    let dir = create_temp_dir();
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let mut manager = stor_client::DownloadManagerBuilder::hidden(format!("http://127.0.0.1:{}", port))
        .directory(dir.path().to_path_buf())
        .retry_attempts(2)
        .retry_delay(TEST_RETRY_DELAY)
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap();
    manager.start().unwrap();
    manager.submit(Digest::of(b"unreachable")).await.unwrap();
    let total = manager.wait_for_completion().await.unwrap();

    assert_eq!(total.failed(), 1);
    assert!(total.is_complete());
}

#[tokio::test]
async fn test_corrupted_blob_is_never_committed() {
    let server = MockServer::start_async().await;
    let dir = create_temp_dir();
    let digest = Digest::of(b"the real content");
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path(format!("/{}", digest));
            then.status(200).body("tampered content");
        })
        .await;

    let mut manager = test_builder(&server, dir.path())
        .retry_attempts(2)
        .build()
        .unwrap();
    manager.start().unwrap();
    manager.submit(digest).await.unwrap();
    let total = manager.wait_for_completion().await.unwrap();

    assert_eq!(mock.hits_async().await, 2);
    assert_eq!(total.failed(), 1);
    assert!(!dir.path().join(digest.to_hex()).exists());
    assert_no_temp_files(dir.path());
}

#[tokio::test]
async fn test_every_submission_is_accounted_for() {
    let server = MockServer::start_async().await;
    let dir = create_temp_dir();

    let mut digests = Vec::new();
    let mut expected_size = 0u64;
    for size in [1, 10, 100, 1000, 10_000] {
        let data = random_blob(size);
        expected_size += size as u64;
        let (digest, _) = serve_blob(&server, &data).await;
        digests.push(digest);
    }
    let missing = Digest::of(b"missing");
    serve_status(&server, &missing, 404).await;
    digests.push(missing);

    let callbacks = Arc::new(AtomicUsize::new(0));
    let counter = callbacks.clone();
    let mut manager = test_builder(&server, dir.path())
        .workers(3)
        .on_complete(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();
    manager.start().unwrap();
    for digest in &digests {
        manager.submit(*digest).await.unwrap();
    }
    let total = manager.wait_for_completion().await.unwrap();

    assert_eq!(callbacks.load(Ordering::SeqCst), 6);
    assert_eq!(total.expected(), 6);
    assert_eq!(total.count(), 6);
    assert_eq!(total.completed(), 5);
    assert_eq!(total.failed(), 1);
    assert_eq!(total.size(), expected_size);
    assert!(total.duration() > Duration::ZERO);

    let report = total.report(Instant::now()).to_string();
    assert!(report.contains("processed 6/6 blobs (5 downloaded, 0 skipped, 1 failed)"));
}

#[tokio::test]
async fn test_concurrent_duplicates_download_once() {
    let server = MockServer::start_async().await;
    let dir = create_temp_dir();
    let data = random_blob(2048);
    let digest = Digest::of(&data);
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path(format!("/{}", digest));
            then.status(200)
                .body(data.clone())
                .delay(Duration::from_millis(300));
        })
        .await;

    let (summaries, on_complete) = collect_summaries();
    let mut manager = test_builder(&server, dir.path())
        .workers(4)
        .on_complete(on_complete)
        .build()
        .unwrap();
    manager.start().unwrap();
    for _ in 0..3 {
        manager.submit(digest).await.unwrap();
    }
    let total = manager.wait_for_completion().await.unwrap();

    assert_eq!(mock.hits_async().await, 1);
    assert_eq!(total.count(), 3);
    assert_eq!(total.completed(), 1);
    assert_eq!(total.skipped(), 2);
    assert_eq!(total.size(), 2048);
    assert!(summaries
        .lock()
        .unwrap()
        .iter()
        .filter(|s| s.outcome().is_skipped())
        .all(|s| s.outcome() == &DownloadOutcome::Skipped(SkipReason::InFlight)));
    assert_file_content(&dir.path().join(digest.to_hex()), &data);
}

#[tokio::test]
async fn test_discard_mode_verifies_without_storing() {
    let server = MockServer::start_async().await;
    let dir = create_temp_dir();
    let good = random_blob(4096);
    let (good_digest, _) = serve_blob(&server, &good).await;
    let bad_digest = Digest::of(b"expected");
    server
        .mock_async(|when, then| {
            when.method(GET).path(format!("/{}", bad_digest));
            then.status(200).body("unexpected");
        })
        .await;

    let mut manager = test_builder(&server, dir.path())
        .discard(true)
        .retry_attempts(1)
        .build()
        .unwrap();
    manager.start().unwrap();
    manager.submit(good_digest).await.unwrap();
    manager.submit(bad_digest).await.unwrap();
    let total = manager.wait_for_completion().await.unwrap();

    assert_eq!(total.completed(), 1);
    assert_eq!(total.failed(), 1);
    assert_eq!(total.size(), 4096);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_custom_headers_are_sent() {
    let server = MockServer::start_async().await;
    let dir = create_temp_dir();
    let data = random_blob(64);
    let digest = Digest::of(&data);
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(format!("/{}", digest))
                .header("x-stor-token", "secret");
            then.status(200).body(data.clone());
        })
        .await;

    let mut manager = test_builder(&server, dir.path())
        .header("x-stor-token", reqwest::header::HeaderValue::from_static("secret"))
        .build()
        .unwrap();
    manager.start().unwrap();
    manager.submit(digest).await.unwrap();
    let total = manager.wait_for_completion().await.unwrap();

    mock.assert_async().await;
    assert_eq!(total.completed(), 1);
}

#[tokio::test]
async fn test_stalled_response_times_out_and_is_retried() {
    let server = MockServer::start_async().await;
    let dir = create_temp_dir();
    let data = random_blob(128);
    let digest = Digest::of(&data);
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path(format!("/{}", digest));
            then.status(200)
                .body(data.clone())
                .delay(Duration::from_secs(3));
        })
        .await;

    let started = Instant::now();
    let mut manager = test_builder(&server, dir.path())
        .timeout(Duration::from_millis(300))
        .retry_attempts(2)
        .build()
        .unwrap();
    manager.start().unwrap();
    manager.submit(digest).await.unwrap();
    let total = manager.wait_for_completion().await.unwrap();

    assert_eq!(total.completed(), 0);
    assert_eq!(total.failed(), 1);
    assert_eq!(mock.hits_async().await, 2);
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_no_temp_files(dir.path());
}
