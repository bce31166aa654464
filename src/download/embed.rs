//! Embed-page rewriting.
//!
//! Some hosts serve a watch page that the extractor cannot fetch media from
//! directly. The page body carries an `"embedUrl":"..."` JSON field pointing
//! at the real media URL, which is handed to the extractor instead.

use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use crate::http_client::{HttpClientError, fetch_page_text};

/// Hosts whose pages are rewritten by default. Subdomains match too.
pub const DEFAULT_EMBED_HOSTS: &[&str] = &["rumble.com"];

const EMBED_FIELD: &str = "embedUrl";
const EMBED_KEY: &str = "\"embedUrl\":";

/// Rewrites embed-platform page links to their media URL.
#[derive(Debug, Clone)]
pub struct EmbedRewriter {
    client: Client,
    hosts: Vec<String>,
}

impl EmbedRewriter {
    /// Creates a rewriter for [`DEFAULT_EMBED_HOSTS`].
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            hosts: DEFAULT_EMBED_HOSTS.iter().map(|h| (*h).to_string()).collect(),
        }
    }

    /// Replaces the set of embed hosts.
    #[must_use]
    pub fn with_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    /// Whether `link` points at one of the embed hosts.
    #[must_use]
    pub fn matches(&self, link: &str) -> bool {
        let Ok(url) = Url::parse(link) else {
            return false;
        };
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        self.hosts.iter().any(|embed_host| {
            host == *embed_host
                || host
                    .strip_suffix(embed_host.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }

    /// Resolves `link` to its embedded media URL.
    ///
    /// Returns `Ok(None)` when the link is not on an embed host or the page
    /// carries no `embedUrl` field.
    ///
    /// # Errors
    ///
    /// Returns [`HttpClientError::Fetch`] if the page cannot be fetched.
    #[instrument(skip(self))]
    pub async fn rewrite(&self, link: &str) -> Result<Option<String>, HttpClientError> {
        if !self.matches(link) {
            return Ok(None);
        }
        let body = fetch_page_text(&self.client, link).await?;
        let embed = scan_embed_url(&body);
        match &embed {
            Some(embed) => debug!(embed = %embed, "rewrote embed page link"),
            None => debug!("no embedUrl on embed page"),
        }
        Ok(embed)
    }
}

/// Extracts the `embedUrl` value from a page body.
///
/// The body is split on commas; each fragment mentioning `embedUrl` has the
/// key and all double quotes stripped. When several fragments match, the
/// last one wins.
#[must_use]
pub fn scan_embed_url(body: &str) -> Option<String> {
    body.rsplit(',')
        .filter(|fragment| fragment.contains(EMBED_FIELD))
        .map(|fragment| {
            fragment
                .replace(EMBED_KEY, "")
                .replace('"', "")
                .replace("\\/", "/")
                .trim_matches(|c: char| c.is_whitespace() || matches!(c, '{' | '}' | '[' | ']'))
                .to_string()
        })
        .find(|value| !value.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn test_scan_embed_url_from_json_ld() {
        let body = r#"<script>{"@type":"VideoObject","name":"Clip","embedUrl":"https://rumble.com/embed/v1abc/","duration":"PT1M"}</script>"#;
        assert_eq!(
            scan_embed_url(body).as_deref(),
            Some("https://rumble.com/embed/v1abc/")
        );
    }

    #[test]
    fn test_scan_embed_url_last_match_wins() {
        let body = r#""embedUrl":"https://a.example/1","x":1,"embedUrl":"https://a.example/2"}"#;
        assert_eq!(scan_embed_url(body).as_deref(), Some("https://a.example/2"));
    }

    #[test]
    fn test_scan_embed_url_unescapes_slashes() {
        let body = r#"{"embedUrl":"https:\/\/rumble.com\/embed\/v9\/"}"#;
        assert_eq!(
            scan_embed_url(body).as_deref(),
            Some("https://rumble.com/embed/v9/")
        );
    }

    #[test]
    fn test_scan_embed_url_absent() {
        assert_eq!(scan_embed_url("<html>no embed here</html>"), None);
    }

    #[test]
    fn test_matches_host_and_subdomains() {
        let rewriter = EmbedRewriter::new(Client::new());
        assert!(rewriter.matches("https://rumble.com/v1abc-clip.html"));
        assert!(rewriter.matches("https://www.Rumble.com/v1abc-clip.html"));
        assert!(!rewriter.matches("https://notrumble.com/v1"));
        assert!(!rewriter.matches("https://www.youtube.com/watch?v=rumble.com"));
        assert!(!rewriter.matches("not a url"));
    }

    #[tokio::test]
    async fn test_rewrite_skips_other_hosts_without_fetching() {
        let server = MockServer::start().await;
        let rewriter = EmbedRewriter::new(Client::new());
        let link = format!("{}/page", server.uri());
        assert_eq!(rewriter.rewrite(&link).await.unwrap(), None);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rewrite_fetches_embed_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1abc-clip.html"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"name":"Clip","embedUrl":"https://media.example/e/1"}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let rewriter = EmbedRewriter::new(Client::new()).with_hosts(["127.0.0.1"]);
        let link = format!("{}/v1abc-clip.html", server.uri());
        assert_eq!(
            rewriter.rewrite(&link).await.unwrap().as_deref(),
            Some("https://media.example/e/1")
        );
    }

    #[tokio::test]
    async fn test_rewrite_reports_fetch_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let rewriter = EmbedRewriter::new(Client::new()).with_hosts(["127.0.0.1"]);
        let err = rewriter
            .rewrite(&format!("{}/x", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, HttpClientError::Fetch { .. }), "{err}");
    }
}
