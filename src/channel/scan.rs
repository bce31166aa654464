//! Text scanners for channel listing pages.
//!
//! Listing pages have no stable structured form, so videos are found by
//! matching known text fragments in the raw page.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

/// Canonical watch URL prefix used for every discovered video.
pub const WATCH_URL_BASE: &str = "https://www.youtube.com/watch";

/// Anchor fragments on the legacy profile layout: `href="/watch?v=..."`.
#[allow(clippy::expect_used)]
static WATCH_ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"href="/watch\?([^"\s]+)""#).expect("watch anchor regex is valid") // Static pattern, safe to panic
});

/// Thumbnail fragments on the channel layout: `https://i.ytimg.com/vi/<id>/hqdefault.`.
#[allow(clippy::expect_used)]
static THUMBNAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https://i\.ytimg\.com/vi/([^/\s"'\\]+?)/hqdefault\."#)
        .expect("thumbnail regex is valid") // Static pattern, safe to panic
});

/// Scans a legacy profile page for watch anchors.
///
/// Each `href="/watch?<query>"` becomes `https://www.youtube.com/watch?<query>`.
/// Results are unique, in page order.
#[must_use]
pub fn scan_watch_anchors(page: &str) -> Vec<String> {
    unique(WATCH_ANCHOR.captures_iter(page).filter_map(|caps| {
        let query = caps.get(1)?.as_str().replace("&amp;", "&");
        trace!(%query, "found watch anchor");
        Some(format!("{WATCH_URL_BASE}?{query}"))
    }))
}

/// Scans a channel listing page for thumbnail URLs and synthesizes watch links
/// from the embedded video identifier.
///
/// Results are unique, in page order.
#[must_use]
pub fn scan_thumbnail_ids(page: &str) -> Vec<String> {
    unique(THUMBNAIL.captures_iter(page).filter_map(|caps| {
        let id = caps.get(1)?.as_str();
        trace!(id, "found thumbnail video id");
        Some(format!("{WATCH_URL_BASE}?v={id}"))
    }))
}

fn unique(links: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    links.filter(|link| seen.insert(link.clone())).collect()
}
