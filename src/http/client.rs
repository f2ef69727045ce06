//! HTTP client setup and middleware configuration.
//!
//! The client used by the workers is a reqwest client wrapped in a tracing
//! middleware. It carries no retry middleware; one attempt is one GET and
//! the worker's retry policy alone decides how many requests reach the store.
//!
//! # Examples
//!
//! ```rust
//! use stor_client::http::{create_http_client, HttpClientConfig};
//! use std::time::Duration;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HttpClientConfig {
//!     timeout: Some(Duration::from_secs(10)),
//!     ..HttpClientConfig::default()
//! };
//!
//! let client = create_http_client(config)?;
//! # Ok(())
//! # }
//! ```

use reqwest::{header::HeaderMap, Proxy};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;
use std::time::Duration;

/// Default connect and read timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for HTTP client setup.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Connect, read and idle-connection timeout; `None` disables it.
    ///
    /// The read timeout bounds each wait for data, so a stalled transfer
    /// fails while a slow but progressing one does not.
    pub timeout: Option<Duration>,
    /// Maximum number of idle connections kept per host.
    pub max_idle_per_host: usize,
    /// Optional proxy configuration.
    pub proxy: Option<Proxy>,
    /// Default headers to include with all requests.
    pub headers: Option<HeaderMap>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_TIMEOUT),
            max_idle_per_host: 4,
            proxy: None,
            headers: None,
        }
    }
}

/// Creates an HTTP client with middleware configuration.
///
/// This function sets up a reqwest client with:
/// - Tracing middleware for request/response logging
/// - Connect, read and idle-pool timeouts, unless disabled
/// - An idle pool sized to the number of workers
/// - Optional proxy support and default headers
pub fn create_http_client(
    config: HttpClientConfig,
) -> Result<ClientWithMiddleware, reqwest::Error> {
    let mut inner_client_builder =
        reqwest::Client::builder().pool_max_idle_per_host(config.max_idle_per_host);

    if let Some(timeout) = config.timeout {
        inner_client_builder = inner_client_builder
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .pool_idle_timeout(timeout);
    }

    if let Some(proxy) = config.proxy {
        inner_client_builder = inner_client_builder.proxy(proxy);
    }

    if let Some(headers) = config.headers {
        inner_client_builder = inner_client_builder.default_headers(headers);
    }

    let inner_client = inner_client_builder.build()?;

    let client = ClientBuilder::new(inner_client)
        // Trace HTTP requests. See the tracing crate to make use of these traces.
        .with(TracingMiddleware::default())
        .build();

    Ok(client)
}
