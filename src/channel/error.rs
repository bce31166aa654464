//! Error types for channel resolution.

use thiserror::Error;

/// Errors that can occur while discovering channel videos.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChannelError {
    /// No page layout yielded any video link within the attempt budget.
    #[error("could not find user or channel '{channel}' after {attempts} attempt(s)")]
    NotFound {
        /// The channel identifier.
        channel: String,
        /// Attempts made before giving up.
        attempts: u32,
    },

    /// The channel identifier was empty.
    #[error("channel identifier must not be empty")]
    EmptyIdentifier,

    /// The listing URL could not be built from the base URL.
    #[error("cannot build listing URL for channel '{channel}' from base {base_url}")]
    InvalidListingUrl {
        /// The channel identifier.
        channel: String,
        /// The configured base URL.
        base_url: String,
    },
}

impl ChannelError {
    /// Creates a `NotFound` error.
    #[must_use]
    pub fn not_found(channel: &str, attempts: u32) -> Self {
        Self::NotFound {
            channel: channel.to_string(),
            attempts,
        }
    }
}
