//! Download manager orchestrating the worker pool.
//!
//! A [`DownloadManager`] owns a fixed number of workers, a bounded request
//! queue feeding them and a bounded result queue drained by the stats
//! aggregator. Its lifecycle is linear:
//!
//! 1. [`DownloadManager::start`] spawns the workers and the aggregator,
//! 2. [`DownloadManager::submit`] enqueues digests, waiting while the queue is full,
//! 3. [`DownloadManager::wait_for_completion`] stops the workers once the queue
//!    is drained and returns the [`TotalStats`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use stor_client::downloader::DownloadManagerBuilder;
//! use stor_client::Digest;
//!
//! # async fn example() -> Result<(), stor_client::Error> {
//! let mut manager = DownloadManagerBuilder::new("http://stor.example.com")
//!     .directory("blobs".into())
//!     .workers(8)
//!     .build()?;
//!
//! manager.start()?;
//! for line in ["e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"] {
//!     manager.submit(line.parse::<Digest>()?).await?;
//! }
//!
//! let total = manager.wait_for_completion().await?;
//! assert!(total.is_complete());
//! # Ok(())
//! # }
//! ```

use super::config::DownloaderConfig;
use super::fetch::Fetcher;
use super::inflight::InFlightTracker;
use super::retry::RetryPolicy;
use super::worker::{WorkItem, Worker, WorkerContext};
use crate::digest::Digest;
use crate::download::{StatsAggregator, Summary, TotalStats};
use crate::error::{Error, Result};
use crate::http::{create_http_client, HttpClientConfig};
use crate::progress::ProgressDisplay;

use reqwest::header::HeaderMap;
use reqwest::Url;
use reqwest_middleware::ClientWithMiddleware;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Handles of a started pool.
struct Running {
    requests: mpsc::Sender<WorkItem>,
    results: mpsc::Sender<Summary>,
    workers: Vec<JoinHandle<()>>,
    aggregator: JoinHandle<TotalStats>,
}

/// Concurrent downloader of content-addressed blobs.
///
/// Created through [`DownloadManager::new`] or the
/// [`DownloadManagerBuilder`](super::DownloadManagerBuilder).
pub struct DownloadManager {
    endpoint: Url,
    config: DownloaderConfig,
    client: ClientWithMiddleware,
    in_flight: InFlightTracker,
    progress: ProgressDisplay,
    expected: AtomicUsize,
    running: Option<Running>,
}

impl fmt::Debug for DownloadManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadManager")
            .field("endpoint", &self.endpoint.as_str())
            .field("config", &self.config)
            .field("expected", &self.expected())
            .field("running", &self.is_running())
            .finish()
    }
}

impl DownloadManager {
    /// Create a manager fetching from `endpoint` into `directory`.
    ///
    /// `config.directory` is replaced by `directory`.
    pub fn new(endpoint: &str, directory: impl Into<PathBuf>, config: DownloaderConfig) -> Result<Self> {
        Self::with_config(
            endpoint,
            DownloaderConfig {
                directory: directory.into(),
                ..config
            },
        )
    }

    pub(crate) fn with_config(endpoint: &str, config: DownloaderConfig) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            Error::InvalidUrl(format!("The url \"{}\" cannot be parsed: {}", endpoint, e))
        })?;
        if endpoint.cannot_be_a_base() {
            return Err(Error::InvalidUrl(format!(
                "The url \"{}\" cannot be used as a storage endpoint",
                endpoint
            )));
        }

        let client = create_http_client(HttpClientConfig {
            timeout: config.timeout,
            max_idle_per_host: config.effective_workers(),
            proxy: config.proxy.clone(),
            headers: config.headers.clone(),
        })?;
        let progress = ProgressDisplay::new(config.style_options.clone());

        Ok(Self {
            endpoint,
            config,
            client,
            in_flight: InFlightTracker::new(),
            progress,
            expected: AtomicUsize::new(0),
            running: None,
        })
    }

    /// Gets the storage endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Gets the directory where blobs are stored.
    pub fn directory(&self) -> &Path {
        &self.config.directory
    }

    /// Gets the number of workers started by [`start`](Self::start).
    pub fn workers(&self) -> usize {
        self.config.effective_workers()
    }

    /// Gets the connect and read timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.config.timeout
    }

    /// Gets the retry policy applied to every blob.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.config.effective_retry_attempts(), self.config.retry_delay)
    }

    /// Gets whether blobs are only verified, not stored.
    pub fn discard(&self) -> bool {
        self.config.discard
    }

    /// Gets whether file names use the upper-cased digest.
    pub fn upper_case(&self) -> bool {
        self.config.naming.upper_case
    }

    /// Gets the file name suffix.
    pub fn suffix(&self) -> &str {
        &self.config.naming.suffix
    }

    /// Gets the custom headers.
    pub fn headers(&self) -> Option<&HeaderMap> {
        self.config.headers.as_ref()
    }

    /// Gets the bound of the request and result queues.
    pub fn queue_capacity(&self) -> usize {
        self.config.queue_capacity.max(1)
    }

    /// Number of digests submitted so far.
    pub fn expected(&self) -> usize {
        self.expected.load(Ordering::SeqCst)
    }

    /// Digests currently claimed by a worker.
    pub fn in_flight(&self) -> &InFlightTracker {
        &self.in_flight
    }

    /// Whether [`start`](Self::start) has spawned the pool.
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Spawn the workers and the stats aggregator on the current tokio runtime.
    pub fn start(&mut self) -> Result<()> {
        if self.running.is_some() {
            return Err(Error::InvalidState("the download manager is already started".into()));
        }
        let runtime = Handle::try_current().map_err(|e| {
            Error::InvalidState(format!("the download manager needs a tokio runtime: {}", e))
        })?;

        let capacity = self.queue_capacity();
        let (requests, queue) = mpsc::channel(capacity);
        let (results, result_stream) = mpsc::channel(capacity);
        let queue = Arc::new(Mutex::new(queue));

        let context = Arc::new(WorkerContext {
            directory: self.config.directory.clone(),
            naming: self.config.naming.clone(),
            fetcher: Fetcher::new(self.client.clone(), self.endpoint.clone(), self.config.discard),
            retry: self.retry_policy(),
            in_flight: self.in_flight.clone(),
            progress: self.progress.clone(),
        });

        let workers = (0..self.workers())
            .map(|id| {
                let worker = Worker::new(id, queue.clone(), results.clone(), context.clone());
                runtime.spawn(worker.run())
            })
            .collect::<Vec<_>>();

        let aggregator = StatsAggregator::new(self.progress.clone(), self.config.on_complete.clone());
        let aggregator = runtime.spawn(aggregator.run(result_stream));

        debug!(workers = workers.len(), capacity, "Download manager started");
        self.running = Some(Running {
            requests,
            results,
            workers,
            aggregator,
        });
        Ok(())
    }

    /// Queue `digest` for download.
    ///
    /// Waits while the request queue is full.
    pub async fn submit(&self, digest: Digest) -> Result<()> {
        let running = self
            .running
            .as_ref()
            .ok_or_else(|| Error::InvalidState("the download manager is not started".into()))?;

        self.expected.fetch_add(1, Ordering::SeqCst);
        self.progress.add_expected();

        if running.requests.send(WorkItem::Fetch(digest)).await.is_err() {
            self.expected.fetch_sub(1, Ordering::SeqCst);
            return Err(Error::Internal(format!(
                "request queue closed, {} was not submitted",
                digest
            )));
        }
        Ok(())
    }

    /// Stop the workers once every submitted digest is processed and return the totals.
    pub async fn wait_for_completion(mut self) -> Result<TotalStats> {
        let Running {
            requests,
            results,
            workers,
            aggregator,
        } = self
            .running
            .take()
            .ok_or_else(|| Error::InvalidState("the download manager is not started".into()))?;

        for _ in 0..workers.len() {
            if requests.send(WorkItem::Stop).await.is_err() {
                break;
            }
        }
        drop(requests);

        for (id, handle) in workers.into_iter().enumerate() {
            if let Err(e) = handle.await {
                error!(worker = id, "Download worker failed: {}", e);
            }
        }

        // The workers' senders are gone; dropping the last one closes the stream.
        drop(results);
        let total = aggregator
            .await
            .map_err(|e| Error::Internal(format!("stats aggregator failed: {}", e)))?;
        self.progress.finish();

        Ok(total.with_expected(self.expected()))
    }
}
