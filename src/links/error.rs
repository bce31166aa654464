//! Error types for link collection.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while collecting links.
#[derive(Debug, Error)]
pub enum LinkError {
    /// A link file could not be read.
    #[error("cannot read link file {path}: {source}\n  Suggestion: check the path passed to --file")]
    ReadFile {
        /// The link file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl LinkError {
    /// Creates a `ReadFile` error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadFile {
            path: path.into(),
            source,
        }
    }
}
