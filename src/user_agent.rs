//! Shared User-Agent string for page fetches.
//!
//! Listing pages and embed pages are served to browsers, so the client
//! presents a browser User-Agent with the tool appended as a product token.

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Default User-Agent for channel and embed page requests.
#[must_use]
pub(crate) fn default_page_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("{BROWSER_USER_AGENT} media-downloader/{version}")
}
