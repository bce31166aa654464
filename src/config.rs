//! Environment-backed configuration for the console tool and the tool server.
//!
//! Values come from the process environment with explicit defaults; command
//! line flags are applied on top by the binaries.

use std::path::PathBuf;

use thiserror::Error;

use crate::http_client::PageTimeouts;

/// Environment variable naming the default download directory.
pub const DOWNLOAD_DIRECTORY_ENV: &str = "DOWNLOAD_DIRECTORY";

/// Environment variable enabling audio-only downloads by default.
pub const AUDIO_ONLY_ENV: &str = "AUDIO_ONLY";

/// Environment variable overriding the `yt-dlp` executable path.
pub const YTDLP_PATH_ENV: &str = "YTDLP_PATH";

/// Environment variable overriding the page connect timeout in seconds.
pub const PAGE_CONNECT_TIMEOUT_ENV: &str = "PAGE_CONNECT_TIMEOUT_SECS";

/// Environment variable overriding the page read timeout in seconds.
pub const PAGE_READ_TIMEOUT_ENV: &str = "PAGE_READ_TIMEOUT_SECS";

const DEFAULT_YTDLP_PATH: &str = "yt-dlp";

/// Errors loading configuration values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A boolean setting held an unrecognized value.
    #[error("cannot convert '{value}' to boolean for {key}\n  Suggestion: use one of true/false, yes/no, t/f, y/n, 1/0")]
    InvalidBool {
        /// Environment key.
        key: String,
        /// Offending value.
        value: String,
    },

    /// A numeric setting was not a valid number in range.
    #[error("invalid value '{value}' for {key}: expected {expected}")]
    InvalidNumber {
        /// Environment key.
        key: String,
        /// Offending value.
        value: String,
        /// Human-readable accepted range.
        expected: &'static str,
    },
}

/// Effective configuration shared by both binaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloaderConfig {
    /// Directory downloaded files land in.
    pub download_directory: PathBuf,
    /// Download audio only (transcoded to mp3).
    pub audio_only: bool,
    /// Path or name of the `yt-dlp` executable.
    pub ytdlp_path: PathBuf,
    /// Timeouts for channel and embed page requests.
    pub page_timeouts: PageTimeouts,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            download_directory: default_download_directory(),
            audio_only: false,
            ytdlp_path: PathBuf::from(DEFAULT_YTDLP_PATH),
            page_timeouts: PageTimeouts::default(),
        }
    }
}

impl DownloaderConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a set variable holds an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a present value is invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(dir) = get(DOWNLOAD_DIRECTORY_ENV) {
            config.download_directory = expand_home(&dir);
        }
        if let Some(value) = get(AUDIO_ONLY_ENV) {
            config.audio_only = parse_bool(AUDIO_ONLY_ENV, &value)?;
        }
        if let Some(path) = get(YTDLP_PATH_ENV) {
            config.ytdlp_path = PathBuf::from(path);
        }
        if let Some(value) = get(PAGE_CONNECT_TIMEOUT_ENV) {
            config.page_timeouts.connect_secs = parse_timeout_secs(PAGE_CONNECT_TIMEOUT_ENV, &value)?;
        }
        if let Some(value) = get(PAGE_READ_TIMEOUT_ENV) {
            config.page_timeouts.read_secs = parse_timeout_secs(PAGE_READ_TIMEOUT_ENV, &value)?;
        }

        Ok(config)
    }
}

/// Returns `~/Downloads`, or `./Downloads` when no home directory is known.
#[must_use]
pub fn default_download_directory() -> PathBuf {
    dirs::home_dir().map_or_else(|| PathBuf::from("Downloads"), |home| home.join("Downloads"))
}

/// Expands a leading `~` to the home directory.
#[must_use]
pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(path));
    }
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}

/// Parses a loose boolean (`t/true/y/yes/1`, `f/false/n/no/0`).
///
/// # Errors
///
/// Returns [`ConfigError::InvalidBool`] for any other value.
pub fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "t" | "true" | "y" | "yes" | "1" => Ok(true),
        "f" | "false" | "n" | "no" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_timeout_secs(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|secs| (1..=3600).contains(secs))
        .ok_or_else(|| ConfigError::InvalidNumber {
            key: key.to_string(),
            value: value.to_string(),
            expected: "1..=3600 seconds",
        })
}
