//! The `download_media` tool.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, error, info, instrument};

use crate::config::expand_home;
use crate::download::{
    DownloadError, DownloadJob, DownloadWorker, EmbedRewriter, ProgressEvent, ProgressSink,
};
use crate::extractor::Extractor;

/// Tool name as listed by `tools/list`.
pub const DOWNLOAD_MEDIA: &str = "download_media";

/// Errors returned by the tool.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Arguments were rejected before any I/O.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// What was wrong.
        message: String,
    },

    /// The download ran and failed.
    #[error("download failed: {source}")]
    DownloadFailed {
        /// The worker's error.
        #[source]
        source: DownloadError,
    },
}

impl ToolError {
    /// Creates an invalid-input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// HTTP-style status: 400 for invalid input, 500 for download failure.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::InvalidInput { .. } => 400,
            Self::DownloadFailed { .. } => 500,
        }
    }

    fn summary(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "Invalid input provided",
            Self::DownloadFailed { .. } => "Failed to download media",
        }
    }
}

/// Raw `download_media` arguments; every member is optional on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DownloadMediaArgs {
    /// Link to download.
    #[serde(default)]
    pub video_url: Option<String>,
    /// Output directory; the configured default when absent.
    #[serde(default)]
    pub download_directory: Option<String>,
    /// Keep only audio; the configured default when absent.
    #[serde(default)]
    pub audio_only: Option<bool>,
}

/// Arguments after defaults and validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArgs {
    /// Link to download.
    pub video_url: String,
    /// Output directory.
    pub download_directory: PathBuf,
    /// Keep only audio.
    pub audio_only: bool,
}

/// Executes `download_media` calls.
#[derive(Clone)]
pub struct DownloadMediaTool {
    extractor: Arc<dyn Extractor>,
    embed: EmbedRewriter,
    default_directory: PathBuf,
    default_audio_only: bool,
}

impl std::fmt::Debug for DownloadMediaTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadMediaTool")
            .field("extractor", &self.extractor.name())
            .field("default_directory", &self.default_directory)
            .field("default_audio_only", &self.default_audio_only)
            .finish_non_exhaustive()
    }
}

impl DownloadMediaTool {
    /// Creates the tool with the defaults used for omitted arguments.
    pub fn new(
        extractor: Arc<dyn Extractor>,
        embed: EmbedRewriter,
        default_directory: impl Into<PathBuf>,
        default_audio_only: bool,
    ) -> Self {
        Self {
            extractor,
            embed,
            default_directory: default_directory.into(),
            default_audio_only,
        }
    }

    /// Tool descriptor for `tools/list`.
    #[must_use]
    pub fn descriptor(&self) -> Value {
        json!({
            "name": DOWNLOAD_MEDIA,
            "title": "Download Media",
            "description": "Downloads media from a given URL to the specified directory, \
                as a video or an audio file. Returns the location of the downloaded file.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "video_url": {
                        "type": "string",
                        "description": "Video URL to download"
                    },
                    "download_directory": {
                        "type": "string",
                        "description": "Directory where the media is saved; the server default when omitted"
                    },
                    "audio_only": {
                        "type": "boolean",
                        "description": "Download only the audio, as mp3"
                    }
                },
                "required": ["video_url"]
            },
            "annotations": {
                "readOnlyHint": false,
                "destructiveHint": false,
                "idempotentHint": true,
                "openWorldHint": false
            }
        })
    }

    /// Applies defaults and rejects empty values.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidInput`] for an empty or missing link, or
    /// an empty output directory.
    pub fn resolve(&self, args: &DownloadMediaArgs) -> Result<ResolvedArgs, ToolError> {
        let video_url = args
            .video_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ToolError::invalid_input("video_url must not be empty"))?;

        let download_directory = match args.download_directory.as_deref().map(str::trim) {
            Some("") => {
                return Err(ToolError::invalid_input(
                    "download_directory must not be empty",
                ));
            }
            Some(dir) => expand_home(dir),
            None => self.default_directory.clone(),
        };

        Ok(ResolvedArgs {
            video_url: video_url.to_string(),
            download_directory,
            audio_only: args.audio_only.unwrap_or(self.default_audio_only),
        })
    }

    /// Runs one download, reporting `(0, 100)` up front and `(100, 100)` at
    /// the end through `sink`.
    ///
    /// # Errors
    ///
    /// - [`ToolError::InvalidInput`] before any I/O for malformed arguments
    /// - [`ToolError::DownloadFailed`] if the worker yields no file
    #[instrument(skip(self, args, sink))]
    pub async fn call(
        &self,
        args: &DownloadMediaArgs,
        sink: Option<Arc<dyn ProgressSink>>,
    ) -> Result<PathBuf, ToolError> {
        let resolved = self.resolve(args)?;
        debug!(
            link = %resolved.video_url,
            directory = %resolved.download_directory.display(),
            audio_only = resolved.audio_only,
            "starting download_media"
        );

        let mut worker = DownloadWorker::new(Arc::clone(&self.extractor), self.embed.clone());
        if let Some(sink) = sink {
            sink.report(&resolved.video_url, ProgressEvent::started());
            worker = worker.with_progress_sink(sink);
        }

        let job = DownloadJob::new(
            resolved.video_url,
            resolved.download_directory,
            resolved.audio_only,
        );
        match worker.try_download(&job).await {
            Ok(path) => {
                info!(link = %job.link, path = %path.display(), "download_media completed");
                Ok(path)
            }
            Err(source) => {
                error!(link = %job.link, stage = ?source.stage(), error = %source, "download_media failed");
                Err(ToolError::DownloadFailed { source })
            }
        }
    }

    /// Structured failure payload echoing the call's arguments.
    #[must_use]
    pub fn failure_payload(&self, args: &DownloadMediaArgs, err: &ToolError) -> Value {
        json!({
            "status": err.status(),
            "message": err.summary(),
            "data": {
                "video_url": args.video_url,
                "download_directory": args
                    .download_directory
                    .clone()
                    .unwrap_or_else(|| self.default_directory.display().to_string()),
                "audio_only": args.audio_only.unwrap_or(self.default_audio_only),
            },
            "error": err.to_string(),
        })
    }
}
