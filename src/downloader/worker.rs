//! Download worker loop.
//!
//! A worker pulls [`WorkItem`]s from the shared request queue until it sees
//! [`WorkItem::Stop`]. For every digest it emits exactly one [`Summary`]:
//!
//! 1. build the target path (a bad path fails without any attempt),
//! 2. skip when the target file already exists,
//! 3. skip when another worker holds the in-flight claim,
//! 4. fetch under the retry policy, holding the claim until done.

use super::fetch::Fetcher;
use super::inflight::InFlightTracker;
use super::retry::RetryPolicy;
use crate::digest::Digest;
use crate::download::{DownloadOutcome, SkipReason, Summary};
use crate::error::Error;
use crate::progress::ProgressDisplay;
use crate::utils::FileNaming;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::fs;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, debug_span, error, warn, Instrument};

/// Item of the request queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WorkItem {
    Fetch(Digest),
    /// Sent once per worker at shutdown, after every real submission.
    Stop,
}

/// State shared by every worker of a pool.
pub(crate) struct WorkerContext {
    pub directory: PathBuf,
    pub naming: FileNaming,
    pub fetcher: Fetcher,
    pub retry: RetryPolicy,
    pub in_flight: InFlightTracker,
    pub progress: ProgressDisplay,
}

pub(crate) struct Worker {
    id: usize,
    queue: Arc<Mutex<mpsc::Receiver<WorkItem>>>,
    results: mpsc::Sender<Summary>,
    context: Arc<WorkerContext>,
}

impl Worker {
    pub fn new(
        id: usize,
        queue: Arc<Mutex<mpsc::Receiver<WorkItem>>>,
        results: mpsc::Sender<Summary>,
        context: Arc<WorkerContext>,
    ) -> Self {
        Self {
            id,
            queue,
            results,
            context,
        }
    }

    /// Process work items until told to stop or the queue is closed.
    pub async fn run(self) {
        debug!(worker = self.id, "Start download worker...");

        loop {
            let item = self.queue.lock().await.recv().await;
            let digest = match item {
                Some(WorkItem::Fetch(digest)) => digest,
                Some(WorkItem::Stop) => {
                    debug!(worker = self.id, "Worker end");
                    return;
                }
                None => {
                    debug!(worker = self.id, "Request queue closed, worker end");
                    return;
                }
            };

            let span = debug_span!("download", worker = self.id, digest = %digest);
            let summary = self.process(digest).instrument(span).await;

            if self.results.send(summary).await.is_err() {
                warn!(worker = self.id, "Result stream closed, worker end");
                return;
            }
        }
    }

    async fn process(&self, digest: Digest) -> Summary {
        let ctx = &self.context;

        let target = match ctx.naming.target_path(&ctx.directory, &digest) {
            Ok(target) => target,
            Err(e) => {
                error!("Cannot build target path: {}", e);
                return Summary::new(digest, None, DownloadOutcome::failed(e));
            }
        };

        if fs::try_exists(&target).await.unwrap_or(false) {
            debug!("File {:?} exists - skip download", target);
            return Summary::new(
                digest,
                Some(target),
                DownloadOutcome::Skipped(SkipReason::AlreadyPresent),
            );
        }

        let Some(claim) = ctx.in_flight.try_claim(digest, self.id) else {
            debug!("File is now downloading in other worker - skip download");
            return Summary::new(
                digest,
                Some(target),
                DownloadOutcome::Skipped(SkipReason::InFlight),
            );
        };

        let started = Instant::now();
        let result = ctx
            .retry
            .execute(
                |_attempt| ctx.fetcher.fetch(&digest, &target, &ctx.progress),
                Error::is_permanent,
            )
            .await;
        let duration = started.elapsed();
        drop(claim);

        let outcome = match result {
            Ok(size) => {
                debug!("Downloaded {} ({} bytes)", digest, size);
                DownloadOutcome::completed(size, duration)
            }
            Err(e) => {
                error!("Error download {}: {}", digest, e);
                DownloadOutcome::failed(e)
            }
        };
        Summary::new(digest, Some(target), outcome)
    }
}
