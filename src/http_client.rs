//! Shared HTTP client construction for page fetches.
//!
//! Channel listings and embed pages are fetched with the same policy:
//! timeouts, browser-like user agent, gzip, and proxy compatibility.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use reqwest::{Client, ClientBuilder, Proxy};
use thiserror::Error;
use tracing::{trace, warn};

use crate::user_agent;

/// Default page connect timeout (10 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default page read timeout (30 seconds).
pub const READ_TIMEOUT_SECS: u64 = 30;

/// Errors building the page HTTP client or fetching a page.
#[derive(Debug, Error)]
pub enum HttpClientError {
    /// The client builder failed.
    #[error("HTTP client construction failed: {0}")]
    Build(#[source] reqwest::Error),

    /// System proxy lookup panicked even with the env-proxy fallback.
    #[error("HTTP client construction panicked while initializing networking")]
    Panicked,

    /// Fetching a page failed (network error or non-success status).
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        /// The page URL.
        url: String,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
}

/// Connect/read timeouts for page requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTimeouts {
    /// Connect timeout in seconds.
    pub connect_secs: u64,
    /// Whole-request timeout in seconds.
    pub read_secs: u64,
}

impl Default for PageTimeouts {
    fn default() -> Self {
        Self {
            connect_secs: CONNECT_TIMEOUT_SECS,
            read_secs: READ_TIMEOUT_SECS,
        }
    }
}

/// Builds the page HTTP client.
///
/// # Errors
///
/// Returns [`HttpClientError`] when client construction fails.
pub fn build_page_client(timeouts: PageTimeouts) -> Result<Client, HttpClientError> {
    match try_build_client(timeouts, false) {
        Ok(client) => Ok(client),
        Err(BuildClientFailure::Panic) => {
            // Some sandboxed environments panic when querying system proxy
            // settings; env proxies still apply through the fallback builder.
            warn!("page client hit system proxy panic; using env-proxy fallback builder");
            match try_build_client(timeouts, true) {
                Ok(client) => Ok(client),
                Err(BuildClientFailure::Panic) => Err(HttpClientError::Panicked),
                Err(BuildClientFailure::Build(error)) => Err(HttpClientError::Build(error)),
            }
        }
        Err(BuildClientFailure::Build(error)) => Err(HttpClientError::Build(error)),
    }
}

/// Fetches `url` and returns the body as text.
///
/// # Errors
///
/// Returns [`HttpClientError::Fetch`] on network failure, non-2xx status, or
/// an undecodable body.
pub async fn fetch_page_text(client: &Client, url: &str) -> Result<String, HttpClientError> {
    let fetch = |source: reqwest::Error| HttpClientError::Fetch {
        url: url.to_string(),
        source,
    };
    let response = client
        .get(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(fetch)?;
    let body = response.text().await.map_err(fetch)?;
    trace!(url, bytes = body.len(), "fetched page");
    Ok(body)
}

enum BuildClientFailure {
    Panic,
    Build(reqwest::Error),
}

fn try_build_client(
    timeouts: PageTimeouts,
    disable_system_proxy_lookup: bool,
) -> Result<Client, BuildClientFailure> {
    catch_unwind(AssertUnwindSafe(move || {
        let mut builder = base_builder(timeouts);
        if disable_system_proxy_lookup {
            builder = apply_env_proxy_fallback(builder.no_proxy());
        }
        builder.build().map_err(BuildClientFailure::Build)
    }))
    .map_err(|_| BuildClientFailure::Panic)?
}

fn base_builder(timeouts: PageTimeouts) -> ClientBuilder {
    Client::builder()
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .timeout(Duration::from_secs(timeouts.read_secs))
        .user_agent(user_agent::default_page_user_agent())
        .gzip(true)
}

fn apply_env_proxy_fallback(mut builder: ClientBuilder) -> ClientBuilder {
    if let Some(proxy) = env_proxy_for_scheme("https")
        && let Ok(resolved) = Proxy::https(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    if let Some(proxy) = env_proxy_for_scheme("http")
        && let Ok(resolved) = Proxy::http(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    builder
}

fn env_proxy_for_scheme(scheme: &str) -> Option<String> {
    match scheme {
        "https" => find_first_proxy_var(&["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"]),
        "http" => find_first_proxy_var(&["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"]),
        _ => None,
    }
}

fn find_first_proxy_var(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_page_timeouts_default() {
        let timeouts = PageTimeouts::default();
        assert_eq!(timeouts.connect_secs, 10);
        assert_eq!(timeouts.read_secs, 30);
    }

    #[test]
    fn test_build_page_client_succeeds_with_defaults() {
        assert!(build_page_client(PageTimeouts::default()).is_ok());
    }

    #[test]
    fn test_env_proxy_unknown_scheme_is_none() {
        assert_eq!(env_proxy_for_scheme("ftp"), None);
    }

    #[tokio::test]
    async fn test_fetch_page_text_reports_url_on_404() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = build_page_client(PageTimeouts::default()).unwrap();
        let url = format!("{}/missing", server.uri());
        let err = fetch_page_text(&client, &url).await.unwrap_err();
        assert!(err.to_string().contains(&url), "error should name URL: {err}");
    }
}
