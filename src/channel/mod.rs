//! Channel video discovery for creator identifiers.
//!
//! Creator listing pages vary by template version and have no stable public
//! API, so the [`ChannelResolver`] degrades through known text patterns:
//!
//! 1. The legacy profile listing (`/user/<id>/videos`), scanned for
//!    `href="/watch?...` anchors.
//! 2. The channel listing (`/c/<id>/videos`), scanned for thumbnail URLs
//!    carrying the video identifier.
//!
//! If neither layout yields a link the whole sequence is retried, up to
//! three attempts, since the served layout may be transient or cached.
//!
//! # Example
//!
//! ```no_run
//! use media_downloader::channel::{ChannelLimit, ChannelResolver};
//! use media_downloader::http_client::{PageTimeouts, build_page_client};
//! use media_downloader::links::LinkSet;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let resolver = ChannelResolver::new(build_page_client(PageTimeouts::default())?);
//! let mut links = LinkSet::new();
//! let added = resolver
//!     .append_to("WhiteHouse", ChannelLimit::from(5), &mut links)
//!     .await;
//! println!("Added {added} links");
//! # Ok(())
//! # }
//! ```

mod error;
mod scan;

pub use error::ChannelError;
pub use scan::{WATCH_URL_BASE, scan_thumbnail_ids, scan_watch_anchors};

use std::fmt;
use std::time::Duration;

use rand::Rng;
use reqwest::Client;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::http_client::fetch_page_text;
use crate::links::LinkSet;

/// Default listing host.
pub const DEFAULT_BASE_URL: &str = "https://www.youtube.com";

/// Total attempts over both page layouts before giving up.
pub const MAX_ATTEMPTS: u32 = 3;

/// Default pause between attempts.
const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Maximum jitter added to the pause between attempts.
const MAX_JITTER: Duration = Duration::from_millis(250);

/// Upper bound on how many discovered links are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelLimit {
    /// Keep every discovered link.
    #[default]
    Unlimited,
    /// Keep at most this many links.
    AtMost(usize),
}

impl ChannelLimit {
    /// Truncates `links` to the limit.
    pub fn apply(self, links: &mut Vec<String>) {
        if let Self::AtMost(max) = self {
            links.truncate(max);
        }
    }
}

impl From<i64> for ChannelLimit {
    /// Negative values mean unlimited.
    fn from(value: i64) -> Self {
        usize::try_from(value).map_or(Self::Unlimited, Self::AtMost)
    }
}

/// Listing page layout that produced the links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLayout {
    /// `/user/<id>/videos` with watch anchors.
    LegacyProfile,
    /// `/c/<id>/videos` with thumbnail identifiers.
    ChannelListing,
}

impl fmt::Display for PageLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LegacyProfile => write!(f, "legacy-profile"),
            Self::ChannelListing => write!(f, "channel-listing"),
        }
    }
}

/// Links discovered for a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelVideos {
    /// Watch links in discovery order, already limited.
    pub links: Vec<String>,
    /// Layout that yielded the links.
    pub layout: PageLayout,
    /// Attempt number (1-indexed) that succeeded.
    pub attempt: u32,
}

/// Discovers recent video links for a creator identifier.
#[derive(Debug, Clone)]
pub struct ChannelResolver {
    client: Client,
    base_url: Url,
    retry_delay: Duration,
}

impl ChannelResolver {
    /// Creates a resolver against the default listing host.
    ///
    /// # Panics
    ///
    /// Never panics: the default base URL is a valid static string.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"), // Static URL, safe to panic
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Points the resolver at another listing host.
    #[must_use]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    /// Sets the pause between attempts. `Duration::ZERO` disables waiting and jitter.
    #[must_use]
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Discovers video links for `channel`.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::NotFound`] when neither layout yields a link
    /// within [`MAX_ATTEMPTS`] attempts, [`ChannelError::EmptyIdentifier`]
    /// for a blank identifier.
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    pub async fn resolve(
        &self,
        channel: &str,
        limit: ChannelLimit,
    ) -> Result<ChannelVideos, ChannelError> {
        let channel = channel.trim();
        if channel.is_empty() {
            return Err(ChannelError::EmptyIdentifier);
        }

        for attempt in 1..=MAX_ATTEMPTS {
            if attempt > 1 {
                let delay = retry_delay_with_jitter(self.retry_delay);
                debug!(attempt, delay_ms = delay.as_millis(), "retrying channel listing");
                tokio::time::sleep(delay).await;
            }

            for layout in [PageLayout::LegacyProfile, PageLayout::ChannelListing] {
                let mut links = self.scan_layout(channel, layout).await?;
                if links.is_empty() {
                    continue;
                }
                info!(found = links.len(), %layout, attempt, "found channel videos");
                limit.apply(&mut links);
                return Ok(ChannelVideos {
                    links,
                    layout,
                    attempt,
                });
            }
        }

        Err(ChannelError::not_found(channel, MAX_ATTEMPTS))
    }

    /// Discovers video links for `channel` and appends them to `links`.
    ///
    /// Resolution failures are logged, not raised; nothing is appended.
    /// Returns how many links were newly added.
    pub async fn append_to(&self, channel: &str, limit: ChannelLimit, links: &mut LinkSet) -> usize {
        match self.resolve(channel, limit).await {
            Ok(videos) => links.extend(videos.links),
            Err(e) => {
                error!(channel, error = %e, "channel resolution failed");
                0
            }
        }
    }

    fn listing_url(&self, channel: &str, layout: PageLayout) -> Result<Url, ChannelError> {
        let kind = match layout {
            PageLayout::LegacyProfile => "user",
            PageLayout::ChannelListing => "c",
        };
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ChannelError::InvalidListingUrl {
                channel: channel.to_string(),
                base_url: self.base_url.to_string(),
            })?
            .pop_if_empty()
            .extend([kind, channel, "videos"]);
        Ok(url)
    }

    async fn scan_layout(
        &self,
        channel: &str,
        layout: PageLayout,
    ) -> Result<Vec<String>, ChannelError> {
        let url = self.listing_url(channel, layout)?;
        debug!(%url, %layout, "fetching channel listing");
        let page = match fetch_page_text(&self.client, url.as_str()).await {
            Ok(page) => page,
            Err(e) => {
                warn!(%layout, error = %e, "channel listing fetch failed");
                return Ok(Vec::new());
            }
        };
        Ok(match layout {
            PageLayout::LegacyProfile => scan_watch_anchors(&page),
            PageLayout::ChannelListing => scan_thumbnail_ids(&page),
        })
    }
}

fn retry_delay_with_jitter(base: Duration) -> Duration {
    if base.is_zero() {
        return Duration::ZERO;
    }
    #[allow(clippy::cast_possible_truncation)] // 250ms fits in u64
    let jitter_ms = rand::thread_rng().gen_range(0..=MAX_JITTER.as_millis() as u64);
    base + Duration::from_millis(jitter_ms)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::http_client::{PageTimeouts, build_page_client};

    fn resolver() -> ChannelResolver {
        ChannelResolver::new(build_page_client(PageTimeouts::default()).unwrap())
    }

    #[test]
    fn test_channel_limit_from_negative_is_unlimited() {
        assert_eq!(ChannelLimit::from(-1), ChannelLimit::Unlimited);
        assert_eq!(ChannelLimit::from(i64::MIN), ChannelLimit::Unlimited);
    }

    #[test]
    fn test_channel_limit_from_non_negative() {
        assert_eq!(ChannelLimit::from(0), ChannelLimit::AtMost(0));
        assert_eq!(ChannelLimit::from(7), ChannelLimit::AtMost(7));
    }

    #[test]
    fn test_channel_limit_apply_truncates() {
        let mut links: Vec<String> = (0..5).map(|i| i.to_string()).collect();
        ChannelLimit::AtMost(2).apply(&mut links);
        assert_eq!(links, ["0", "1"]);

        let mut links: Vec<String> = (0..5).map(|i| i.to_string()).collect();
        ChannelLimit::Unlimited.apply(&mut links);
        assert_eq!(links.len(), 5);
    }

    #[test]
    fn test_listing_urls_for_both_layouts() {
        let resolver = resolver();
        assert_eq!(
            resolver
                .listing_url("WhiteHouse", PageLayout::LegacyProfile)
                .unwrap()
                .as_str(),
            "https://www.youtube.com/user/WhiteHouse/videos"
        );
        assert_eq!(
            resolver
                .listing_url("WhiteHouse", PageLayout::ChannelListing)
                .unwrap()
                .as_str(),
            "https://www.youtube.com/c/WhiteHouse/videos"
        );
    }

    #[test]
    fn test_listing_url_escapes_identifier() {
        let url = resolver()
            .listing_url("a b/c", PageLayout::LegacyProfile)
            .unwrap();
        assert_eq!(url.path(), "/user/a%20b%2Fc/videos");
    }

    #[test]
    fn test_retry_delay_zero_has_no_jitter() {
        assert_eq!(retry_delay_with_jitter(Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn test_retry_delay_jitter_bounded() {
        let base = Duration::from_millis(100);
        for _ in 0..50 {
            let delay = retry_delay_with_jitter(base);
            assert!(delay >= base && delay <= base + MAX_JITTER);
        }
    }

    #[tokio::test]
    async fn test_resolve_rejects_blank_identifier() {
        let err = resolver().resolve("   ", ChannelLimit::Unlimited).await.unwrap_err();
        assert_eq!(err, ChannelError::EmptyIdentifier);
    }

    #[test]
    fn test_page_layout_display() {
        assert_eq!(PageLayout::LegacyProfile.to_string(), "legacy-profile");
        assert_eq!(PageLayout::ChannelListing.to_string(), "channel-listing");
    }
}
