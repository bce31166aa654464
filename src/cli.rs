//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Download videos or audio from almost anywhere on the internet.
///
/// Links are collected from a channel, a link file and an inline list (in
/// that order), de-duplicated, then downloaded in parallel.
#[derive(Parser, Debug)]
#[command(name = "media-downloader")]
#[command(author, version, about)]
#[command(after_help = "Example:\n  media-downloader -f links.txt -l \"URL1,URL2\" -c WhiteHouse -d ~/Downloads")]
pub struct Args {
    /// Download audio only (best audio, transcoded to mp3 320 kbps)
    #[arg(short, long)]
    pub audio: bool,

    /// YouTube channel or user name; downloads its listed videos
    #[arg(short, long)]
    pub channel: Option<String>,

    /// Directory the files are saved to (default: $DOWNLOAD_DIRECTORY or ~/Downloads)
    #[arg(short, long)]
    pub directory: Option<String>,

    /// Text file with one link per line
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Comma-separated links (spaces are ignored)
    #[arg(short, long)]
    pub links: Option<String>,

    /// Maximum channel videos to queue (negative for no limit)
    #[arg(short = 'n', long, default_value_t = -1, allow_negative_numbers = true)]
    pub limit: i64,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// True when no link source was given.
    #[must_use]
    pub fn has_no_sources(&self) -> bool {
        self.channel.is_none() && self.file.is_none() && self.links.is_none()
    }
}
