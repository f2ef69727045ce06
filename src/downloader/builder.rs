//! Builder pattern implementation for creating [`DownloadManager`] instances.
//!
//! # Examples
//!
//! ## Basic Builder Usage
//!
//! ```rust
//! use stor_client::downloader::DownloadManagerBuilder;
//! use std::path::PathBuf;
//! use std::time::Duration;
//!
//! # fn example() -> Result<(), stor_client::Error> {
//! let manager = DownloadManagerBuilder::new("http://stor.example.com")
//!     .directory(PathBuf::from("./blobs"))
//!     .workers(16)
//!     .retry_attempts(3)
//!     .retry_delay(Duration::from_millis(250))
//!     .build()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Verifying Without Storing
//!
//! ```rust
//! use stor_client::downloader::DownloadManagerBuilder;
//! use stor_client::download::DownloadOutcome;
//!
//! # fn example() -> Result<(), stor_client::Error> {
//! let manager = DownloadManagerBuilder::hidden("http://stor.example.com")
//!     .discard(true)
//!     .on_complete(|summary| {
//!         if let DownloadOutcome::Failed(msg) = summary.outcome() {
//!             eprintln!("{} is broken: {}", summary.digest(), msg);
//!         }
//!     })
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use super::{config::DownloaderConfig, manager::DownloadManager};
use crate::download::Summary;
use crate::error::Result;
use crate::StyleOptions;

use reqwest::header::{HeaderMap, HeaderValue, IntoHeaderName};
use std::{path::PathBuf, sync::Arc, time::Duration};

/// A builder used to create a [`DownloadManager`].
///
/// ```rust
/// # fn main() -> Result<(), stor_client::Error> {
/// use stor_client::downloader::DownloadManagerBuilder;
///
/// let m = DownloadManagerBuilder::new("http://localhost:8080")
///     .upper_case(true)
///     .suffix(".blob")
///     .build()?;
/// assert_eq!(m.suffix(), ".blob");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DownloadManagerBuilder {
    endpoint: String,
    config: DownloaderConfig,
}

impl DownloadManagerBuilder {
    /// Creates a builder for the store at `endpoint` with the default options.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            config: DownloaderConfig::default(),
        }
    }

    /// Convenience function to hide the progress bars.
    pub fn hidden(endpoint: impl Into<String>) -> Self {
        Self::new(endpoint).style_options(StyleOptions::hidden())
    }

    /// Sets the directory where to store the blobs.
    pub fn directory(mut self, directory: PathBuf) -> Self {
        self.config.directory = directory;
        self
    }

    /// Set the number of workers. 0 selects the default.
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    /// Set the connect and read timeout of each request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Disable the request timeouts.
    pub fn no_timeout(mut self) -> Self {
        self.config.timeout = None;
        self
    }

    /// Set the pause between two attempts of the same blob.
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.config.retry_delay = delay;
        self
    }

    /// Set the maximum number of attempts per blob. 0 selects the default.
    pub fn retry_attempts(mut self, attempts: u32) -> Self {
        self.config.retry_attempts = attempts;
        self
    }

    /// Verify blobs without writing them to disk.
    pub fn discard(mut self, discard: bool) -> Self {
        self.config.discard = discard;
        self
    }

    /// Name files after the upper-cased digest.
    pub fn upper_case(mut self, upper_case: bool) -> Self {
        self.config.naming.upper_case = upper_case;
        self
    }

    /// Append `suffix` to every file name.
    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.naming.suffix = suffix.into();
        self
    }

    /// Set the bound of the request and result queues.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// Set the downloader style options.
    pub fn style_options(mut self, style_options: StyleOptions) -> Self {
        self.config.style_options = style_options;
        self
    }

    /// Route every request through `proxy`.
    pub fn proxy(mut self, proxy: reqwest::Proxy) -> Self {
        self.config.proxy = Some(proxy);
        self
    }

    /// Set callback for when each digest has been processed.
    ///
    /// The callback runs on the stats aggregator, once per submitted digest,
    /// whatever the outcome.
    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Summary) + Send + Sync + 'static,
    {
        self.config.on_complete = Some(Arc::new(Box::new(callback)));
        self
    }

    fn header_map(&mut self) -> &mut HeaderMap {
        self.config.headers.get_or_insert_with(HeaderMap::new)
    }

    /// Add the http headers.
    ///
    /// Calling `.headers()` multiple times merges the maps.
    ///
    /// ```
    /// use reqwest::header::{self, HeaderValue, HeaderMap};
    /// use stor_client::downloader::DownloadManagerBuilder;
    ///
    /// let ua = HeaderValue::from_static("stor-client/0.1");
    /// let builder = DownloadManagerBuilder::new("http://localhost:8080")
    ///     .headers(HeaderMap::from_iter([(header::USER_AGENT, ua)]));
    /// ```
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.header_map().extend(headers);
        self
    }

    /// Add the http header.
    ///
    /// See also [`headers()`](DownloadManagerBuilder::headers).
    pub fn header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        self.header_map().insert(name, value);
        self
    }

    /// Create the [`DownloadManager`] with the specified options.
    ///
    /// Fails when the endpoint is not an absolute URL or the HTTP client
    /// cannot be built.
    pub fn build(self) -> Result<DownloadManager> {
        DownloadManager::with_config(&self.endpoint, self.config)
    }
}
