//! Per-link download workers and the batch coordinator that fans them out.
//!
//! A [`DownloadWorker`] turns one link into one file: it rewrites embed
//! pages to their media URL, runs the extractor with the primary naming
//! template and retries once with the id template. A [`BatchCoordinator`]
//! drains a [`LinkSet`](crate::LinkSet), runs one worker per link on a pool
//! sized to the machine and reports which outputs actually landed on disk.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use media_downloader::{BatchCoordinator, DownloadWorker, EmbedRewriter, LinkSet, YtDlpExtractor};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = reqwest::Client::new();
//! let worker = DownloadWorker::new(Arc::new(YtDlpExtractor::default()), EmbedRewriter::new(client));
//! let coordinator = BatchCoordinator::new(Arc::new(worker));
//!
//! let mut links: LinkSet = ["https://www.youtube.com/watch?v=abc".to_string()].into_iter().collect();
//! if let Some(path) = coordinator.download_all(&mut links, Path::new("./downloads"), false).await {
//!     println!("downloaded {}", path.display());
//! }
//! # Ok(())
//! # }
//! ```

mod batch;
mod embed;
mod error;
mod progress;
mod worker;

pub use batch::{BatchCoordinator, BatchReport, DownloadStats, JobOutcome, default_pool_size};
pub use embed::{DEFAULT_EMBED_HOSTS, EmbedRewriter, scan_embed_url};
pub use error::{AttemptStage, DownloadError};
pub use progress::{ChannelSink, FnSink, ProgressEvent, ProgressSink, ProgressUpdate};
pub use worker::{DownloadJob, DownloadWorker};

use std::path::{Path, PathBuf};

/// Returns `path` only if it exists on disk right now.
#[must_use]
pub fn verified_output(path: &Path) -> Option<PathBuf> {
    if path.exists() {
        Some(path.to_path_buf())
    } else {
        None
    }
}
