//! Downloader module containing the worker pool, its building blocks and configuration.
//!
//! # Overview
//!
//! - `manager` - [`DownloadManager`] owning the queues, the workers and the stats aggregator
//! - `builder` - [`DownloadManagerBuilder`] for configuring a manager
//! - `config` - Configuration structure, defaults and callback type
//! - `fetch` - [`Fetcher`] making a single verify-then-commit attempt
//! - `retry` - [`RetryPolicy`] with a constant delay between attempts
//! - `inflight` - [`InFlightTracker`] preventing two workers from fetching the same digest
//!
//! # Examples
//!
//! ```rust,no_run
//! use stor_client::downloader::DownloadManagerBuilder;
//! use stor_client::Digest;
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), stor_client::Error> {
//! let mut manager = DownloadManagerBuilder::new("http://stor.example.com")
//!     .directory(PathBuf::from("./blobs"))
//!     .on_complete(|summary| println!("{}: {:?}", summary.digest(), summary.outcome()))
//!     .build()?;
//!
//! manager.start()?;
//! manager.submit(Digest::of(b"hello")).await?;
//! let total = manager.wait_for_completion().await?;
//! println!("{}", total.report(std::time::Instant::now()));
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod config;
pub mod fetch;
pub mod inflight;
pub mod manager;
pub mod retry;
pub(crate) mod worker;

pub use builder::DownloadManagerBuilder;
pub use config::{DownloadCallback, DownloaderConfig, DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKERS};
pub use fetch::Fetcher;
pub use inflight::{InFlightClaim, InFlightTracker};
pub use manager::DownloadManager;
pub use retry::{RetryPolicy, DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_DELAY};
