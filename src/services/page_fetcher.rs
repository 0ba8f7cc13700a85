use std::time::Duration;

use anyhow::Context;
use fake_user_agent::get_rua;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::Client;

/// Thin wrapper around a shared reqwest client. Every page request carries a
/// rotating user agent; probes are short HEAD requests used while building
/// the roster.
pub struct PageFetcher {
    client: Client,
    probe_timeout: Duration,
}

impl PageFetcher {
    pub fn new(fetch_timeout: Duration, probe_timeout: Duration) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = Client::builder()
            .timeout(fetch_timeout)
            .default_headers(headers)
            .cookie_store(true)
            .build()
            .expect("Failed to build HTTP client");

        PageFetcher {
            client,
            probe_timeout,
        }
    }

    pub async fn fetch_page(&self, url: &str) -> anyhow::Result<String> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, get_rua())
            .send()
            .await
            .with_context(|| format!("request to {} failed", url))?
            .error_for_status()
            .with_context(|| format!("{} returned an error status", url))?;

        let body = response
            .text()
            .await
            .with_context(|| format!("failed to read body from {}", url))?;

        Ok(body)
    }

    /// Reachability probe for career-page candidates. Any transport error
    /// or non-success status counts as unreachable.
    pub async fn is_reachable(&self, url: &str) -> bool {
        match self
            .client
            .head(url)
            .header(USER_AGENT, get_rua())
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
