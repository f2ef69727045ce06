//! Shared utility functions.
//!
//! This module contains the helpers that turn a digest into a request URL and
//! into paths on disk. They are used by the workers and the fetcher alike.
//!
//! # Examples
//!
//! ```rust
//! use stor_client::utils::{blob_url, temp_path, FileNaming};
//! use stor_client::Digest;
//! use reqwest::Url;
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let digest = Digest::of(b"hello");
//! let endpoint = Url::parse("http://stor.example.com/")?;
//! let url = blob_url(&endpoint, &digest);
//!
//! let naming = FileNaming { upper_case: true, suffix: ".bin".into() };
//! let target = naming.target_path(Path::new("blobs"), &digest)?;
//! let temp = temp_path(&target);
//! # Ok(())
//! # }
//! ```

pub mod naming;

pub use naming::{blob_url, temp_path, FileNaming, TEMP_SUFFIX};
