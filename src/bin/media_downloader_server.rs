//! Tool server entry point: JSON-RPC over stdin/stdout.
//!
//! Stdout carries protocol messages only, so all logging goes to stderr.
//! Verbosity comes from `RUST_LOG` (default `info`).

use std::sync::Arc;

use anyhow::{Context, Result};
use media_downloader::http_client::build_page_client;
use media_downloader::server::{DownloadMediaTool, ToolServer};
use media_downloader::{DownloaderConfig, EmbedRewriter, YtDlpExtractor};
use tokio::io::BufReader;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = DownloaderConfig::from_env().context("invalid environment configuration")?;
    info!(
        download_directory = %config.download_directory.display(),
        audio_only = config.audio_only,
        ytdlp = %config.ytdlp_path.display(),
        "starting media-downloader tool server"
    );

    let client = build_page_client(config.page_timeouts)?;
    let tool = DownloadMediaTool::new(
        Arc::new(YtDlpExtractor::new(&config.ytdlp_path)),
        EmbedRewriter::new(client),
        config.download_directory,
        config.audio_only,
    );

    ToolServer::new(tool)
        .serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;

    info!("input closed, shutting down");
    Ok(())
}
