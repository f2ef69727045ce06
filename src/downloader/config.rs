//! Configuration structures and defaults for the download manager.
//!
//! [`DownloaderConfig`] holds every option of a [`DownloadManager`]; it is
//! usually filled through the [`DownloadManagerBuilder`].
//!
//! # Examples
//!
//! ## Using Callbacks
//!
//! ```rust
//! use stor_client::downloader::DownloadCallback;
//! use stor_client::download::{DownloadOutcome, Summary};
//!
//! let callback: DownloadCallback = Box::new(|summary: &Summary| {
//!     match summary.outcome() {
//!         DownloadOutcome::Completed { size, .. } => println!("✓ {} ({} bytes)", summary.digest(), size),
//!         DownloadOutcome::Skipped(reason) => println!("- {} ({})", summary.digest(), reason),
//!         DownloadOutcome::Failed(msg) => println!("✗ {} - {}", summary.digest(), msg),
//!     }
//! });
//! ```
//!
//! [`DownloadManager`]: super::DownloadManager
//! [`DownloadManagerBuilder`]: super::DownloadManagerBuilder

use super::retry::{DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_DELAY};
use crate::download::Summary;
use crate::http::DEFAULT_TIMEOUT;
use crate::progress::StyleOptions;
use crate::utils::FileNaming;

use reqwest::header::HeaderMap;
use std::env::current_dir;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Callback type for download completion events
pub type DownloadCallback = Box<dyn Fn(&Summary) + Send + Sync>;

/// Default number of workers.
pub const DEFAULT_WORKERS: usize = 4;
/// Default bound of the request and result queues.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Configuration structure for the download manager
#[derive(Clone)]
pub struct DownloaderConfig {
    /// Directory where to store the downloaded blobs.
    pub directory: PathBuf,
    /// Number of workers downloading in parallel.
    pub workers: usize,
    /// Connect and read timeout of each request, `None` for no timeout.
    pub timeout: Option<Duration>,
    /// Pause between two attempts of the same blob.
    pub retry_delay: Duration,
    /// Maximum number of attempts per blob.
    pub retry_attempts: u32,
    /// Verify blobs without writing them to disk.
    pub discard: bool,
    /// File naming inside `directory`.
    pub naming: FileNaming,
    /// Bound of the request and result queues.
    pub queue_capacity: usize,
    /// Downloader style options.
    pub style_options: StyleOptions,
    /// Custom HTTP headers.
    pub headers: Option<HeaderMap>,
    /// Optional proxy configuration.
    pub proxy: Option<reqwest::Proxy>,
    /// Callback for when each digest has been processed.
    pub on_complete: Option<Arc<DownloadCallback>>,
}

impl std::fmt::Debug for DownloaderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloaderConfig")
            .field("directory", &self.directory)
            .field("workers", &self.workers)
            .field("timeout", &self.timeout)
            .field("retry_delay", &self.retry_delay)
            .field("retry_attempts", &self.retry_attempts)
            .field("discard", &self.discard)
            .field("naming", &self.naming)
            .field("queue_capacity", &self.queue_capacity)
            .field("style_options", &self.style_options)
            .field("headers", &self.headers)
            .field("proxy", &self.proxy)
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            directory: current_dir().unwrap_or_default(),
            workers: DEFAULT_WORKERS,
            timeout: Some(DEFAULT_TIMEOUT),
            retry_delay: DEFAULT_RETRY_DELAY,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            discard: false,
            naming: FileNaming::default(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            style_options: StyleOptions::default(),
            headers: None,
            proxy: None,
            on_complete: None,
        }
    }
}

impl DownloaderConfig {
    /// Worker count, with 0 meaning the default.
    pub(crate) fn effective_workers(&self) -> usize {
        match self.workers {
            0 => DEFAULT_WORKERS,
            n => n,
        }
    }

    /// Attempt count, with 0 meaning the default.
    pub(crate) fn effective_retry_attempts(&self) -> u32 {
        match self.retry_attempts {
            0 => DEFAULT_RETRY_ATTEMPTS,
            n => n,
        }
    }
}
