//! Download module containing result types and their aggregation.
//!
//! # Overview
//!
//! - [`summary`] - [`Summary`] and [`DownloadOutcome`], one per submitted digest
//! - [`stats`] - [`StatsAggregator`] and the [`TotalStats`] it produces
//!
//! # Examples
//!
//! ```rust
//! use stor_client::download::{DownloadOutcome, SkipReason};
//!
//! let outcome = DownloadOutcome::Skipped(SkipReason::AlreadyPresent);
//! match outcome {
//!     DownloadOutcome::Completed { size, .. } => println!("downloaded {} bytes", size),
//!     DownloadOutcome::Skipped(reason) => println!("skipped: {}", reason),
//!     DownloadOutcome::Failed(msg) => println!("failed: {}", msg),
//! }
//! ```

pub mod stats;
pub mod summary;

pub use stats::{StatsAggregator, StatsReport, TotalStats};
pub use summary::{DownloadOutcome, SkipReason, Summary};
