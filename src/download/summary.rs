//! Per-blob download results.
//!
//! Every submitted digest produces exactly one [`Summary`], carrying the
//! [`DownloadOutcome`] of that digest. Summaries travel from the workers to the
//! stats aggregator and are handed to the `on_complete` callback, if any.
//!
//! # Examples
//!
//! ```rust
//! use stor_client::download::{DownloadOutcome, SkipReason, Summary};
//! use stor_client::Digest;
//! use std::time::Duration;
//!
//! let digest = Digest::of(b"blob");
//! let summary = Summary::new(digest, None, DownloadOutcome::completed(4, Duration::from_millis(3)));
//! assert!(summary.outcome().is_completed());
//!
//! let skipped = Summary::new(digest, None, DownloadOutcome::Skipped(SkipReason::InFlight));
//! match skipped.outcome() {
//!     DownloadOutcome::Skipped(reason) => println!("skipped: {}", reason),
//!     _ => unreachable!(),
//! }
//! ```

use crate::digest::Digest;

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Why a digest was not downloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The target file already exists.
    AlreadyPresent,
    /// Another worker of this process is downloading the same digest.
    InFlight,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AlreadyPresent => f.write_str("file already exists"),
            SkipReason::InFlight => f.write_str("download in progress in another worker"),
        }
    }
}

/// Final state of one submitted digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The blob was fetched and verified.
    Completed {
        /// Bytes transferred.
        size: u64,
        /// Time spent on the whole retry sequence.
        duration: Duration,
    },
    /// Nothing had to be fetched.
    Skipped(SkipReason),
    /// Every attempt failed, or the failure was permanent.
    Failed(String),
}

impl DownloadOutcome {
    pub fn completed(size: u64, duration: Duration) -> Self {
        DownloadOutcome::Completed { size, duration }
    }

    /// Mark the outcome as failed with a message.
    pub fn failed(msg: impl fmt::Display) -> Self {
        DownloadOutcome::Failed(msg.to_string())
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, DownloadOutcome::Completed { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, DownloadOutcome::Skipped(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, DownloadOutcome::Failed(_))
    }
}

/// Result of processing one submitted digest.
#[derive(Debug, Clone)]
pub struct Summary {
    digest: Digest,
    /// Target path, when one could be constructed.
    path: Option<PathBuf>,
    outcome: DownloadOutcome,
}

impl Summary {
    /// Create a new [`Summary`].
    pub fn new(digest: Digest, path: Option<PathBuf>, outcome: DownloadOutcome) -> Self {
        Self {
            digest,
            path,
            outcome,
        }
    }

    pub fn digest(&self) -> &Digest {
        &self.digest
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn outcome(&self) -> &DownloadOutcome {
        &self.outcome
    }

    /// Bytes transferred, 0 unless completed.
    pub fn size(&self) -> u64 {
        match self.outcome {
            DownloadOutcome::Completed { size, .. } => size,
            _ => 0,
        }
    }
}
