//! Aggregation of per-blob results into run totals.
//!
//! The [`StatsAggregator`] runs as its own task and folds every [`Summary`]
//! coming out of the workers into a [`TotalStats`]. Durations are summed per
//! blob across all workers; they measure time spent downloading, not the wall
//! clock time of the run, so [`TotalStats::throughput`] is an unparallel rate.

use super::summary::{DownloadOutcome, Summary};
use crate::downloader::config::DownloadCallback;
use crate::progress::ProgressDisplay;

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info};

const MIB: f64 = 1024.0 * 1024.0;

/// Totals of a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TotalStats {
    size: u64,
    duration: Duration,
    count: usize,
    expected: usize,
    completed: usize,
    skipped: usize,
    failed: usize,
}

impl TotalStats {
    /// Bytes transferred by completed downloads.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Sum of the per-blob download durations.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Number of processed digests, whatever their outcome.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Number of digests submitted before shutdown.
    pub fn expected(&self) -> usize {
        self.expected
    }

    /// Number of digests downloaded and verified.
    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Number of digests already present or in flight elsewhere.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Number of digests whose last attempt failed.
    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Whether every submitted digest has been accounted for.
    ///
    /// Skipped and failed digests are accounted for too; use [`failed`] to
    /// tell a clean run from one with failures.
    ///
    /// [`failed`]: TotalStats::failed
    pub fn is_complete(&self) -> bool {
        self.count == self.expected
    }

    /// Bytes per second over the summed download durations.
    pub fn throughput(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.size as f64 / secs
        } else {
            0.0
        }
    }

    /// Human readable report of the run started at `started`.
    pub fn report(&self, started: Instant) -> StatsReport {
        StatsReport {
            stats: *self,
            elapsed: started.elapsed(),
        }
    }

    /// Log the report of the run started at `started`.
    pub fn log(&self, started: Instant) {
        info!("{}", self.report(started));
    }

    pub(crate) fn with_expected(self, expected: usize) -> Self {
        Self { expected, ..self }
    }

    fn record(&mut self, outcome: &DownloadOutcome) {
        self.count += 1;
        match outcome {
            DownloadOutcome::Completed { size, duration } => {
                self.size += size;
                self.duration += *duration;
                self.completed += 1;
            }
            DownloadOutcome::Skipped(_) => self.skipped += 1,
            DownloadOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// Formatted totals, see [`TotalStats::report`].
#[derive(Debug, Clone, Copy)]
pub struct StatsReport {
    stats: TotalStats,
    elapsed: Duration,
}

impl fmt::Display for StatsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let size_mib = self.stats.size as f64 / MIB;
        let download_secs = self.stats.duration.as_secs_f64();
        let elapsed_secs = self.elapsed.as_secs_f64();
        let wall_rate = if elapsed_secs > 0.0 {
            size_mib / elapsed_secs
        } else {
            0.0
        };

        writeln!(
            f,
            "processed {}/{} blobs ({} downloaded, {} skipped, {} failed)",
            self.stats.count,
            self.stats.expected,
            self.stats.completed,
            self.stats.skipped,
            self.stats.failed
        )?;
        writeln!(f, "total downloaded size: {:.3}MiB", size_mib)?;
        writeln!(f, "total time: {:.3}s", elapsed_secs)?;
        writeln!(
            f,
            "download time: {:.3}s (sum of all downloads => unparallel)",
            download_secs
        )?;
        write!(
            f,
            "download rate {:.3}MiB/s (unparallel rate {:.3}MiB/s)",
            wall_rate,
            self.stats.throughput() / MIB
        )
    }
}

/// Folds [`Summary`] values into a [`TotalStats`].
pub struct StatsAggregator {
    total: TotalStats,
    progress: ProgressDisplay,
    on_complete: Option<Arc<DownloadCallback>>,
}

impl StatsAggregator {
    /// Create an aggregator advancing `progress` and calling `on_complete` per result.
    pub fn new(progress: ProgressDisplay, on_complete: Option<Arc<DownloadCallback>>) -> Self {
        Self {
            total: TotalStats::default(),
            progress,
            on_complete,
        }
    }

    /// Account for one processed digest.
    pub fn record(&mut self, summary: &Summary) {
        self.total.record(summary.outcome());
        self.progress.increment_main();

        if let Some(ref callback) = self.on_complete {
            callback(summary);
        }
    }

    /// Current totals.
    pub fn total(&self) -> &TotalStats {
        &self.total
    }

    /// Consume `results` until every sender is gone and return the totals.
    pub async fn run(mut self, mut results: mpsc::Receiver<Summary>) -> TotalStats {
        while let Some(summary) = results.recv().await {
            self.record(&summary);
        }
        debug!(count = self.total.count, "Result stream closed");
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::Digest;
    use crate::download::SkipReason;
    use crate::progress::StyleOptions;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn summary(outcome: DownloadOutcome) -> Summary {
        Summary::new(Digest::of(b"stats"), None, outcome)
    }

    fn aggregator() -> StatsAggregator {
        StatsAggregator::new(ProgressDisplay::new(StyleOptions::hidden()), None)
    }

    #[test]
    fn test_only_completed_contribute_bytes_and_duration() {
        let mut agg = aggregator();
        agg.record(&summary(DownloadOutcome::completed(100, Duration::from_millis(10))));
        agg.record(&summary(DownloadOutcome::completed(50, Duration::from_millis(5))));
        agg.record(&summary(DownloadOutcome::Skipped(SkipReason::AlreadyPresent)));
        agg.record(&summary(DownloadOutcome::failed("nope")));

        let total = agg.total();
        assert_eq!(total.size(), 150);
        assert_eq!(total.duration(), Duration::from_millis(15));
        assert_eq!(total.count(), 4);
        assert_eq!(total.completed(), 2);
        assert_eq!(total.skipped(), 1);
        assert_eq!(total.failed(), 1);
    }

    #[test]
    fn test_is_complete_compares_with_expected() {
        let mut agg = aggregator();
        agg.record(&summary(DownloadOutcome::failed("nope")));
        let total = *agg.total();

        assert!(total.with_expected(1).is_complete());
        assert!(!total.with_expected(2).is_complete());
    }

    #[test]
    fn test_throughput_uses_summed_duration() {
        let mut agg = aggregator();
        agg.record(&summary(DownloadOutcome::completed(1000, Duration::from_secs(1))));
        agg.record(&summary(DownloadOutcome::completed(1000, Duration::from_secs(1))));

        assert!((agg.total().throughput() - 1000.0).abs() < f64::EPSILON);
        assert_eq!(TotalStats::default().throughput(), 0.0);
    }

    #[test]
    fn test_report_mentions_unparallel_rate() {
        let total = TotalStats::default().with_expected(3);
        let report = total.report(Instant::now()).to_string();
        assert!(report.contains("processed 0/3 blobs"));
        assert!(report.contains("unparallel"));
    }

    #[tokio::test]
    async fn test_run_drains_stream_and_calls_back() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let callback: DownloadCallback = Box::new(move |_summary: &Summary| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });
        let agg = StatsAggregator::new(
            ProgressDisplay::new(StyleOptions::hidden()),
            Some(Arc::new(callback)),
        );

        let (tx, rx) = mpsc::channel(4);
        let handle = tokio::spawn(agg.run(rx));
        for _ in 0..3 {
            tx.send(summary(DownloadOutcome::Skipped(SkipReason::InFlight)))
                .await
                .unwrap();
        }
        drop(tx);

        let total = handle.await.unwrap();
        assert_eq!(total.count(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
