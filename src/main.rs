//! CLI entry point for the media downloader.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use media_downloader::config::expand_home;
use media_downloader::http_client::build_page_client;
use media_downloader::{
    BatchCoordinator, ChannelLimit, ChannelResolver, DownloadWorker, DownloaderConfig,
    EmbedRewriter, LinkSet, YtDlpExtractor,
};
use tracing::{debug, info, warn};

mod cli;
mod console;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let config = DownloaderConfig::from_env().context("invalid environment configuration")?;
    let output_dir: PathBuf = args
        .directory
        .as_deref()
        .map_or_else(|| config.download_directory.clone(), expand_home);
    let audio_only = args.audio || config.audio_only;

    let client = build_page_client(config.page_timeouts)?;
    let mut links = LinkSet::new();

    if let Some(channel) = &args.channel {
        let resolver = ChannelResolver::new(client.clone());
        let added = resolver
            .append_to(channel, ChannelLimit::from(args.limit), &mut links)
            .await;
        info!(channel = %channel, added, "collected channel videos");
    }
    if let Some(file) = &args.file {
        let added = links.extend_from_file(file)?;
        info!(file = %file.display(), added, "collected links from file");
    }
    if let Some(inline) = &args.links {
        let added = links.extend_inline(inline);
        debug!(added, "collected inline links");
    }

    if links.is_empty() {
        if args.has_no_sources() {
            info!("No input provided. Pass links with -l, a link file with -f or a channel with -c.");
            info!("Example: media-downloader -l \"https://www.youtube.com/watch?v=...\"");
        } else {
            warn!("No links collected; nothing to download");
        }
        return Ok(());
    }

    let extractor = Arc::new(YtDlpExtractor::new(&config.ytdlp_path));
    let mut worker = DownloadWorker::new(extractor, EmbedRewriter::new(client));
    if let Some(sink) = console::console_sink(args.quiet) {
        worker = worker.with_progress_sink(sink);
    }
    let coordinator = BatchCoordinator::new(Arc::new(worker));

    info!(
        links = links.len(),
        output_dir = %output_dir.display(),
        audio_only,
        "Kicking off downloads"
    );
    let report = coordinator.run(&mut links, &output_dir, audio_only).await;

    match report.first_success() {
        Some(path) => info!(
            completed = report.stats.completed(),
            failed = report.stats.failed(),
            first = %path.display(),
            "Download complete"
        ),
        None => warn!(
            failed = report.stats.failed(),
            "Download complete; no file was downloaded"
        ),
    }

    Ok(())
}
