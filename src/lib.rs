//! stor-client is a crate downloading content-addressed blobs from a storage
//! service, concurrently and with every blob verified against its SHA-256
//! digest before it lands on disk.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use std::time::Instant;
//! use stor_client::{Digest, DownloadManagerBuilder, Error};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Error> {
//! let started = Instant::now();
//! let mut manager = DownloadManagerBuilder::new("http://stor.example.com")
//!     .directory(PathBuf::from("output"))
//!     .workers(8)
//!     .build()?;
//!
//! manager.start()?;
//! manager
//!     .submit("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855".parse()?)
//!     .await?;
//! let total = manager.wait_for_completion().await?;
//! total.log(started);
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`digest`] - The [`Digest`] blob identity and its streaming hasher
//! - [`download`] - Per-blob [`Summary`] results and their aggregation into [`TotalStats`]
//! - [`downloader`] - The [`DownloadManager`], its builder and its building blocks
//! - [`error`] - Centralized error handling with the `Error` enum
//! - [`http`] - HTTP client construction
//! - [`progress`] - Progress bar styling and display management
//! - [`utils`] - File naming and URL helpers

pub mod digest;
pub mod download;
pub mod downloader;
pub mod error;
pub mod http;
pub mod progress;
pub mod utils;

pub use digest::Digest;
pub use download::{DownloadOutcome, SkipReason, Summary, TotalStats};
pub use downloader::{DownloadManager, DownloadManagerBuilder};
pub use error::{Error, Result};
pub use http::{create_http_client, HttpClientConfig};
pub use progress::{ProgressBarOpts, StyleOptions};
