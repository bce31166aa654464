//! Batch coordinator: one worker per link on a bounded pool.
//!
//! # Concurrency Model
//!
//! - The link set is drained once; each link becomes a [`DownloadJob`]
//! - Each job runs in its own Tokio task inside a [`JoinSet`]
//! - A semaphore permit is held for the whole job (pool size = CPU count)
//! - All jobs run to completion; one failure never cancels its siblings
//! - Dropping the coordinator future aborts every task still in the set

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use super::verified_output;
use super::worker::{DownloadJob, DownloadWorker};
use crate::links::LinkSet;

/// Pool size used when none is configured: the machine's available parallelism.
#[must_use]
pub fn default_pool_size() -> NonZeroUsize {
    std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)
}

/// Statistics from a batch run.
///
/// Atomic counters so concurrent jobs can update them without locking.
#[derive(Debug, Default)]
pub struct DownloadStats {
    completed: AtomicUsize,
    failed: AtomicUsize,
}

impl DownloadStats {
    /// Creates a tracker with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Jobs that produced a file.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Jobs that produced nothing.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// All finished jobs.
    #[must_use]
    pub fn total(&self) -> usize {
        self.completed() + self.failed()
    }

    fn record(&self, success: bool) {
        if success {
            self.completed.fetch_add(1, Ordering::SeqCst);
        } else {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn snapshot(&self) -> Self {
        Self {
            completed: AtomicUsize::new(self.completed()),
            failed: AtomicUsize::new(self.failed()),
        }
    }
}

/// Outcome of one job in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    /// The link as it was in the link set.
    pub link: String,
    /// Path the worker reported, if it succeeded.
    pub output: Option<PathBuf>,
}

/// Everything a batch run produced, in submission order.
#[derive(Debug)]
pub struct BatchReport {
    /// Per-job outcomes, indexed like the drained link set.
    pub outcomes: Vec<JobOutcome>,
    /// Completion counters.
    pub stats: DownloadStats,
}

impl BatchReport {
    /// First output, in submission order, that exists on disk right now.
    #[must_use]
    pub fn first_success(&self) -> Option<PathBuf> {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.output.as_deref())
            .find_map(verified_output)
    }

    /// Every output that exists on disk right now, in submission order.
    #[must_use]
    pub fn successes(&self) -> Vec<PathBuf> {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.output.as_deref())
            .filter_map(verified_output)
            .collect()
    }
}

/// Fans a link set out to download workers.
#[derive(Debug, Clone)]
pub struct BatchCoordinator {
    worker: Arc<DownloadWorker>,
    pool_size: NonZeroUsize,
}

impl BatchCoordinator {
    /// Creates a coordinator sized to the machine's parallelism.
    pub fn new(worker: Arc<DownloadWorker>) -> Self {
        Self {
            worker,
            pool_size: default_pool_size(),
        }
    }

    /// Overrides the pool size.
    #[must_use]
    pub fn with_pool_size(mut self, pool_size: NonZeroUsize) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Maximum number of jobs running at once.
    #[must_use]
    pub fn pool_size(&self) -> usize {
        self.pool_size.get()
    }

    /// Drains `links` and downloads every link into `output_dir`.
    ///
    /// The link set is empty when this returns, whatever the outcome.
    /// Individual failures never fail the batch; they show up as outcomes
    /// without an output and in [`DownloadStats::failed`].
    #[instrument(skip(self, links), fields(output_dir = %output_dir.display()))]
    pub async fn run(&self, links: &mut LinkSet, output_dir: &Path, audio_only: bool) -> BatchReport {
        let links = links.take();
        let stats = Arc::new(DownloadStats::new());
        let semaphore = Arc::new(Semaphore::new(self.pool_size.get()));
        let mut tasks = JoinSet::new();

        info!(jobs = links.len(), pool_size = self.pool_size.get(), "starting batch");

        for (index, link) in links.iter().enumerate() {
            let job = DownloadJob::new(link.as_str(), output_dir, audio_only);
            let worker = Arc::clone(&self.worker);
            let stats = Arc::clone(&stats);
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(async move {
                // Permit is held until the job ends
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    warn!(link = %job.link, "download pool closed before job started");
                    stats.record(false);
                    return (index, None);
                };
                let output = worker.download(&job).await;
                stats.record(output.is_some());
                (index, output)
            });
        }

        debug!(task_count = tasks.len(), "waiting for downloads to complete");

        let mut outputs: Vec<Option<PathBuf>> = vec![None; links.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, output)) => outputs[index] = output,
                Err(e) => {
                    // A panicked job counts as a failure; its slot stays empty
                    warn!(error = %e, "download task panicked");
                    stats.record(false);
                }
            }
        }

        let outcomes: Vec<JobOutcome> = links
            .into_iter()
            .zip(outputs)
            .map(|(link, output)| JobOutcome { link, output })
            .collect();

        let stats = Arc::try_unwrap(stats).unwrap_or_else(|shared| shared.snapshot());
        info!(
            completed = stats.completed(),
            failed = stats.failed(),
            total = stats.total(),
            "batch complete"
        );

        BatchReport { outcomes, stats }
    }

    /// Drains `links`, downloads them all and returns the first file, in
    /// submission order, that exists on disk.
    pub async fn download_all(
        &self,
        links: &mut LinkSet,
        output_dir: &Path,
        audio_only: bool,
    ) -> Option<PathBuf> {
        self.run(links, output_dir, audio_only).await.first_success()
    }
}
