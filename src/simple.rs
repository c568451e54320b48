//! A browser-less fetcher that returns a page's raw HTML.
//!
//! This performs a single HTTP GET with browser-like headers and hands back
//! the body bytes untouched, together with the upstream `Content-Type`. The
//! body is never decoded, so pages in legacy encodings survive unchanged.
//! No scripts are executed and nothing is retried; any network error or
//! non-2xx status is reported as an upstream failure.

use std::time::Duration;

use log::debug;
use reqwest::header::{HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, USER_AGENT};
use reqwest::Client;

use crate::validate::ValidatedUrl;
use crate::{Error, Result};

/// User agent of a current desktop Chrome, to get past trivial bot blocking
pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

const BROWSER_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

const BROWSER_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// An upstream response as received
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticPage {
    /// Upstream `Content-Type`, if it sent one
    pub content_type: Option<HeaderValue>,
    pub body: Vec<u8>,
}

/// Static fetcher sharing one connection pool across requests.
///
/// Cloning is cheap; clones share the underlying client.
#[derive(Debug, Clone)]
pub struct StaticFetcher {
    client: Client,
}

impl StaticFetcher {
    /// Build a fetcher whose requests are bounded by `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Fetch `url` and return its body verbatim.
    pub async fn fetch(&self, url: &ValidatedUrl) -> Result<StaticPage> {
        let res = self
            .client
            .get(url.as_str())
            .header(USER_AGENT, DESKTOP_USER_AGENT)
            .header(ACCEPT, BROWSER_ACCEPT)
            .header(ACCEPT_LANGUAGE, BROWSER_ACCEPT_LANGUAGE)
            .send()
            .await
            .map_err(|e| Error::UpstreamFetchFailed(format!("HTTP GET {} failed: {}", url, e)))?;

        let status = res.status();
        if !status.is_success() {
            return Err(Error::UpstreamFetchFailed(format!(
                "{} responded with {}",
                url, status
            )));
        }

        let content_type = res.headers().get(CONTENT_TYPE).cloned();
        let body = res
            .bytes()
            .await
            .map_err(|e| Error::UpstreamFetchFailed(format!("Failed to read body: {}", e)))?;

        debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(StaticPage {
            content_type,
            body: body.to_vec(),
        })
    }
}
