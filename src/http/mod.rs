//! HTTP module containing HTTP client functionality.
//!
//! This module provides the client the workers use to talk to the store:
//! a reqwest client with tracing middleware, timeouts, an idle pool sized to
//! the worker count, optional proxy and default headers.
//!
//! # Examples
//!
//! ```rust
//! use stor_client::http::{create_http_client, HttpClientConfig};
//! use reqwest::header::{HeaderMap, USER_AGENT};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut headers = HeaderMap::new();
//! headers.insert(USER_AGENT, "stor-client/0.1".parse()?);
//!
//! let config = HttpClientConfig {
//!     headers: Some(headers),
//!     ..HttpClientConfig::default()
//! };
//!
//! let client = create_http_client(config)?;
//! # Ok(())
//! # }
//! ```

pub mod client;

pub use client::{create_http_client, HttpClientConfig, DEFAULT_TIMEOUT};
