//! Error types for the download module.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::extractor::ExtractorError;

/// Which extraction attempt a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptStage {
    /// First attempt, with the descriptive naming template.
    Primary,
    /// Single retry, with the id naming template.
    Fallback,
}

impl fmt::Display for AttemptStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Primary => "primary",
            Self::Fallback => "fallback",
        })
    }
}

/// Errors that can occur while downloading one link.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The output directory could not be created.
    #[error("cannot create output directory {path}: {source}\n  Suggestion: check the path and its permissions")]
    CreateDir {
        /// Directory that could not be created.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The extractor failed on the given attempt.
    #[error("{stage} download of {link} failed: {source}")]
    Extraction {
        /// Link being downloaded (after any embed rewrite).
        link: String,
        /// Attempt that failed.
        stage: AttemptStage,
        /// The extractor's error.
        #[source]
        source: ExtractorError,
    },

    /// The extractor reported a path that is not on disk.
    #[error("download of {link} reported {path} but no such file exists")]
    MissingFile {
        /// Link being downloaded.
        link: String,
        /// Path the extractor reported.
        path: PathBuf,
    },
}

impl DownloadError {
    /// Creates an extraction error for `stage`.
    pub fn extraction(link: impl Into<String>, stage: AttemptStage, source: ExtractorError) -> Self {
        Self::Extraction {
            link: link.into(),
            stage,
            source,
        }
    }

    /// Creates a directory creation error.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::CreateDir {
            path: path.into(),
            source,
        }
    }

    /// The attempt this error came from, if it came from the extractor.
    #[must_use]
    pub fn stage(&self) -> Option<AttemptStage> {
        match self {
            Self::Extraction { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
