//! Link collection into an ordered, deduplicated [`LinkSet`].
//!
//! Links come from explicit lists, newline-delimited files, and
//! comma-separated inline strings. All sources merge into one set keyed by
//! exact string equality; the first occurrence of a link keeps its position.
//! Links are not validated here; malformed ones fail later in the worker.
//!
//! # Example
//!
//! ```
//! use media_downloader::links::LinkSet;
//!
//! let mut links = LinkSet::new();
//! links.extend(["a", "b", "a", "c"]);
//! links.extend_inline("c, d,,e");
//! let collected: Vec<&str> = links.iter().collect();
//! assert_eq!(collected, ["a", "b", "c", "d", "e"]);
//! ```

mod error;

pub use error::LinkError;

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use tracing::{debug, instrument};

/// Insertion-ordered set of links with uniqueness enforced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkSet {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl LinkSet {
    /// Creates an empty link set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one link. Returns `true` if it was not already present.
    pub fn push(&mut self, link: impl Into<String>) -> bool {
        let link = link.into();
        if self.seen.contains(&link) {
            return false;
        }
        self.seen.insert(link.clone());
        self.order.push(link);
        true
    }

    /// Adds links in order, skipping ones already present.
    ///
    /// Returns how many were newly inserted.
    pub fn extend<I, S>(&mut self, links: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        links
            .into_iter()
            .map(|link| usize::from(self.push(link)))
            .sum()
    }

    /// Adds links from a comma-separated string.
    ///
    /// Spaces are removed before splitting and empty entries are skipped.
    pub fn extend_inline(&mut self, inline: &str) -> usize {
        let compact: String = inline.chars().filter(|c| *c != ' ').collect();
        self.extend(compact.split(',').filter(|link| !link.is_empty()))
    }

    /// Adds links from newline-delimited text.
    ///
    /// Lines are trimmed and blank lines skipped.
    pub fn extend_lines(&mut self, text: &str) -> usize {
        self.extend(text.lines().map(str::trim).filter(|line| !line.is_empty()))
    }

    /// Adds links from a newline-delimited file.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::ReadFile`] if the file cannot be read.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn extend_from_file(&mut self, path: &Path) -> Result<usize, LinkError> {
        let text = std::fs::read_to_string(path).map_err(|e| LinkError::read_file(path, e))?;
        let added = self.extend_lines(&text);
        debug!(added, total = self.len(), "collected links from file");
        Ok(added)
    }

    /// Returns the number of links.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if there are no links.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterates links in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Removes and returns all links in insertion order, leaving the set empty.
    pub fn take(&mut self) -> Vec<String> {
        self.seen.clear();
        std::mem::take(&mut self.order)
    }

    /// Removes all links.
    pub fn clear(&mut self) {
        self.order.clear();
        self.seen.clear();
    }
}

impl<S: Into<String>> FromIterator<S> for LinkSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl fmt::Display for LinkSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} link(s)", self.order.len())
    }
}
