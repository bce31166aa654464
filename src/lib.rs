//! Media Downloader Core Library
//!
//! This library provides the orchestration layer of the media downloader:
//! it collects links, discovers channel videos, and drives an external
//! extractor over a batch of links in parallel.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`links`] - Link collection into an ordered, deduplicated set
//! - [`channel`] - Channel video discovery by tiered page scanning
//! - [`extractor`] - Extractor capability interface and the `yt-dlp` backend
//! - [`download`] - Per-link download worker, batch coordinator, progress
//! - [`server`] - Tool-serving boundary exposing `download_media`
//! - [`config`] - Environment-backed configuration

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod channel;
pub mod config;
pub mod download;
pub mod extractor;
pub mod http_client;
pub mod links;
pub mod server;
mod user_agent;

// Re-export commonly used types
pub use channel::{ChannelError, ChannelLimit, ChannelResolver, ChannelVideos};
pub use config::{ConfigError, DownloaderConfig};
pub use download::{
    BatchCoordinator, BatchReport, DownloadError, DownloadJob, DownloadStats, DownloadWorker,
    EmbedRewriter, ProgressEvent, ProgressSink, verified_output,
};
pub use extractor::{ExtractOptions, ExtractedMedia, Extractor, ExtractorError, YtDlpExtractor};
pub use links::{LinkError, LinkSet};
