//! Extractor capability interface.
//!
//! Media retrieval, format negotiation and transcoding are delegated to an
//! external extractor. The rest of the crate only sees the [`Extractor`]
//! trait: give it a link and an [`ExtractOptions`] bundle, get back the
//! metadata and the final file path, or an opaque [`ExtractorError`].
//!
//! [`YtDlpExtractor`] is the production implementation and drives the
//! `yt-dlp` executable.

mod error;
mod options;
mod template;
mod ytdlp;

pub use error::ExtractorError;
pub use options::{
    AudioCodec, ExtractOptions, ExtractorLogger, FormatSelector, PostProcessor, ProgressHook,
    ProgressHookEvent, TracingLogger,
};
pub use template::{ID_PATTERN, OutputTemplate, TITLE_PATTERN, UPLOADER_TITLE_PATTERN};
pub use ytdlp::{YtDlpExtractor, parse_progress_line};

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;

/// Metadata the crate needs from an extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MediaInfo {
    /// Stable resource identifier.
    pub id: String,
    /// Human title.
    #[serde(default)]
    pub title: Option<String>,
    /// Uploader or channel name.
    #[serde(default)]
    pub uploader: Option<String>,
    /// Container extension of the selected format.
    #[serde(default)]
    pub ext: Option<String>,
}

impl MediaInfo {
    /// Looks up a template field by name. Empty values count as missing.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "id" => Some(self.id.as_str()),
            "title" => self.title.as_deref(),
            "uploader" => self.uploader.as_deref(),
            "ext" => self.ext.as_deref(),
            _ => None,
        };
        value.filter(|v| !v.trim().is_empty())
    }
}

/// Result of a successful extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedMedia {
    /// Metadata of the extracted resource.
    pub info: MediaInfo,
    /// Final on-disk path after post-processing.
    pub filepath: PathBuf,
}

/// An external media extractor.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Name for logging.
    fn name(&self) -> &'static str;

    /// Fetches `link` according to `options` and returns where it landed.
    async fn extract(
        &self,
        link: &str,
        options: &ExtractOptions,
    ) -> Result<ExtractedMedia, ExtractorError>;
}
