//! Progress module containing progress bar functionality.
//!
//! This module provides progress bar styling and display management for a
//! running download pool: a main bar for processed versus submitted blobs and
//! transient child bars for blobs in transfer.
//!
//! # Examples
//!
//! ## Using with the Download Manager
//!
//! ```rust
//! use stor_client::downloader::DownloadManagerBuilder;
//! use stor_client::progress::StyleOptions;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = DownloadManagerBuilder::new("http://stor.example.com")
//!     .style_options(StyleOptions::default())
//!     .build()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Hidden Progress Bars
//!
//! ```rust
//! use stor_client::progress::{ProgressBarOpts, StyleOptions};
//!
//! let hidden_style = StyleOptions::new(ProgressBarOpts::hidden(), ProgressBarOpts::hidden());
//! assert!(!hidden_style.is_enabled());
//! ```

pub(crate) mod display;
pub(crate) mod style;

pub use display::ProgressDisplay;
pub use style::{ProgressBarOpts, StyleOptions};
