//! Single download attempt with verify-then-commit semantics.
//!
//! The [`Fetcher`] issues one GET for a digest, streams the body through a
//! SHA-256 hasher and into either a discard sink or `{target}.temp`, checks
//! the digest and only then renames the temp file onto `{target}`. A file at
//! the target path has therefore always been verified, and a failed attempt
//! never leaves a temp file behind.

use crate::digest::{Digest, DigestHasher};
use crate::error::{Error, Result};
use crate::progress::ProgressDisplay;
use crate::utils::naming::{blob_url, temp_path};

use futures::StreamExt;
use reqwest::{StatusCode, Url};
use reqwest_middleware::ClientWithMiddleware;
use std::fmt;
use std::io;
use std::path::Path;
use tokio::fs::{self, File};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

/// Fetches blobs from one store endpoint.
#[derive(Clone)]
pub struct Fetcher {
    client: ClientWithMiddleware,
    endpoint: Url,
    discard: bool,
}

impl fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fetcher")
            .field("endpoint", &self.endpoint.as_str())
            .field("discard", &self.discard)
            .finish()
    }
}

impl Fetcher {
    /// Create a fetcher for the store at `endpoint`.
    ///
    /// With `discard` set, blobs are verified but never written to disk.
    pub fn new(client: ClientWithMiddleware, endpoint: Url, discard: bool) -> Self {
        Self {
            client,
            endpoint,
            discard,
        }
    }

    /// Gets the store endpoint blobs are requested from.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Gets whether blobs are only verified, not stored.
    pub fn discard(&self) -> bool {
        self.discard
    }

    /// Make one attempt at fetching `digest` into `target`.
    ///
    /// Returns the number of bytes received.
    pub async fn fetch(
        &self,
        digest: &Digest,
        target: &Path,
        progress: &ProgressDisplay,
    ) -> Result<u64> {
        if self.discard {
            self.stream_to(digest, &mut tokio::io::sink(), progress).await
        } else {
            self.fetch_via_temp_file(digest, target, progress).await
        }
    }

    async fn fetch_via_temp_file(
        &self,
        digest: &Digest,
        target: &Path,
        progress: &ProgressDisplay,
    ) -> Result<u64> {
        let temp = temp_path(target);

        if fs::try_exists(&temp).await? {
            debug!("Removing stale temp file {:?}", temp);
            fs::remove_file(&temp).await?;
        }

        if let Some(dir) = target.parent() {
            fs::create_dir_all(dir).await?;
        }

        match self.fetch_into(digest, &temp, target, progress).await {
            Ok(size) => Ok(size),
            Err(err) => {
                if let Err(remove_err) = fs::remove_file(&temp).await {
                    if remove_err.kind() != io::ErrorKind::NotFound {
                        warn!("Cleanup of temp file {:?} failed: {}", temp, remove_err);
                    }
                }
                Err(err)
            }
        }
    }

    async fn fetch_into(
        &self,
        digest: &Digest,
        temp: &Path,
        target: &Path,
        progress: &ProgressDisplay,
    ) -> Result<u64> {
        debug!("Creating temp file {:?}", temp);
        let mut file = File::create(temp).await?;
        let size = self.stream_to(digest, &mut file, progress).await?;
        file.flush().await?;
        drop(file);

        fs::rename(temp, target).await?;
        debug!("Committed {} bytes to {:?}", size, target);
        Ok(size)
    }

    /// GET the blob and copy it into `out`, verifying its digest on the way.
    async fn stream_to<W>(
        &self,
        digest: &Digest,
        out: &mut W,
        progress: &ProgressDisplay,
    ) -> Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        let url = blob_url(&self.endpoint, digest);
        debug!("Fetching {}", url);

        let res = self.client.get(url.as_str()).send().await?;
        if res.status() != StatusCode::OK {
            return Err(Error::Status {
                digest: *digest,
                status: res.status(),
            });
        }

        let pb = progress.create_child_progress(res.content_length().unwrap_or(0));
        let mut hasher = DigestHasher::new();
        let mut size: u64 = 0;

        let mut stream = res.bytes_stream();
        let copied = async {
            while let Some(item) = stream.next().await {
                let chunk = item?;
                hasher.update(&chunk);
                out.write_all(&chunk).await?;
                size += chunk.len() as u64;
                pb.inc(chunk.len() as u64);
            }
            Ok::<(), Error>(())
        }
        .await;
        progress.finish_child(pb);
        copied?;

        let actual = hasher.finalize();
        if actual != *digest {
            return Err(Error::DigestMismatch {
                expected: *digest,
                actual,
            });
        }

        Ok(size)
    }
}
