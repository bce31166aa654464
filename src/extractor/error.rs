//! Error types for extractor invocations.
//!
//! Callers treat every variant as an opaque failure to catch and retry; the
//! variants exist so logs and server payloads carry useful context.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by an [`Extractor`](super::Extractor).
#[derive(Debug, Error)]
pub enum ExtractorError {
    /// The extractor program could not be started.
    #[error("failed to start extractor {program}: {source}\n  Suggestion: install yt-dlp or set YTDLP_PATH")]
    Spawn {
        /// Program that failed to start.
        program: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The extractor ran and reported failure.
    #[error("extractor failed for {link} (exit code {code:?}): {message}")]
    Failed {
        /// Link being extracted.
        link: String,
        /// Process exit code, if any.
        code: Option<i32>,
        /// Last error line reported by the extractor.
        message: String,
    },

    /// Extracted metadata could not be read.
    #[error("invalid metadata for {link}: {reason}")]
    Metadata {
        /// Link being extracted.
        link: String,
        /// Why the metadata was rejected.
        reason: String,
    },

    /// The output template referenced a field the metadata does not carry.
    #[error("output template {template:?} needs field '{field}' which is missing")]
    TemplateField {
        /// The template pattern.
        template: String,
        /// The missing field name.
        field: String,
    },

    /// The extractor finished without reporting where the file landed.
    #[error("extractor reported no output file for {link}")]
    MissingOutput {
        /// Link being extracted.
        link: String,
    },

    /// Reading extractor output failed.
    #[error("IO error talking to extractor for {link}: {source}")]
    Io {
        /// Link being extracted.
        link: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl ExtractorError {
    /// Creates a `Failed` error.
    pub fn failed(link: impl Into<String>, code: Option<i32>, message: impl Into<String>) -> Self {
        Self::Failed {
            link: link.into(),
            code,
            message: message.into(),
        }
    }

    /// Creates a `Metadata` error.
    pub fn metadata(link: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Metadata {
            link: link.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `TemplateField` error.
    pub fn template_field(template: impl Into<String>, field: impl Into<String>) -> Self {
        Self::TemplateField {
            template: template.into(),
            field: field.into(),
        }
    }

    /// Creates an `Io` error.
    pub fn io(link: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            link: link.into(),
            source,
        }
    }
}
