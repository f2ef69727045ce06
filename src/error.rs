//! Error handling for the stor client.
//!
//! This module provides centralized error handling for everything that can go
//! wrong while fetching a blob. Errors are split along the lines the retry
//! policy cares about: transport and filesystem failures, unexpected HTTP
//! statuses, and content that does not hash to the requested digest.

use crate::digest::Digest;

use reqwest::StatusCode;
use std::io;
use thiserror::Error;

/// Errors that can happen when using the stor client.
#[derive(Error, Debug)]
pub enum Error {
    /// Error from an underlying system.
    ///
    /// This variant captures internal errors that don't fit into other categories,
    /// such as a worker queue that was closed unexpectedly.
    #[error("Internal error: {0}")]
    Internal(String),

    /// The storage endpoint cannot be parsed or is not a base URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// An operation was called at the wrong point of the manager lifecycle.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A digest string is not 64 hexadecimal characters.
    #[error("Invalid digest: {0}")]
    InvalidDigest(String),

    /// The target path of a blob cannot be constructed.
    ///
    /// This is reported as a failure immediately, without entering the retry loop.
    #[error("Invalid target path: {0}")]
    InvalidPath(String),

    /// The store answered with something else than `200 OK`.
    #[error("Download of {digest} failed with status {status}")]
    Status {
        /// Requested digest.
        digest: Digest,
        /// Status returned by the store.
        status: StatusCode,
    },

    /// The received bytes do not hash to the requested digest.
    #[error("Downloaded digest {actual} is not equal to the expected digest {expected}")]
    DigestMismatch {
        /// Requested digest.
        expected: Digest,
        /// Digest of the bytes actually received.
        actual: Digest,
    },

    /// I/O Error.
    ///
    /// This variant wraps standard I/O errors that can occur during file operations,
    /// such as creating, writing, renaming or removing files.
    #[error("I/O error: {source}")]
    IOError {
        #[from]
        source: io::Error,
    },

    /// Error from the Reqwest library.
    #[error("Reqwest error: {source}")]
    Reqwest {
        #[from]
        source: reqwest::Error,
    },

    /// Error from the middleware stack wrapping the HTTP client.
    #[error("HTTP middleware error: {source}")]
    Middleware {
        #[from]
        source: reqwest_middleware::Error,
    },
}

impl Error {
    /// Whether retrying the operation is pointless.
    ///
    /// Only a "not found" answer from the store is permanent; every other
    /// failure (transport, filesystem, integrity, other statuses) may be transient.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            Error::Status {
                status: StatusCode::NOT_FOUND,
                ..
            }
        )
    }
}

/// Result type alias for operations that can fail with a stor client error.
pub type Result<T> = std::result::Result<T, Error>;
