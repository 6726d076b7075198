//! Shared HTTP access for discovery and extraction.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use url::Url;

use crate::constants::USER_AGENT;

const MAX_REDIRECTS: usize = 10;

/// A fetched document after redirects were followed.
#[derive(Debug)]
pub struct FetchedPage {
    /// Final URL of the response.
    pub url: Url,
    pub content_type: Option<String>,
    pub body: String,
}

/// Thin wrapper around a `reqwest::Client` with the crawler's user agent and
/// a per-request timeout. Cloning is cheap and shares the connection pool.
#[derive(Clone, Debug)]
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    /// Creates a fetcher whose requests are aborted after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .timeout(timeout)
            .build()
            .context("Unable to build HTTP client")?;

        Ok(Self { client })
    }

    /// Fetches `url` as text.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure, timeout, a non-success status or
    /// an unreadable body.
    pub async fn get(&self, url: &str) -> Result<FetchedPage> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context(format!("Request to {url} failed"))?
            .error_for_status()?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_lowercase);
        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .context(format!("Unable to read body of {url}"))?;

        Ok(FetchedPage {
            url: final_url,
            content_type,
            body,
        })
    }
}
