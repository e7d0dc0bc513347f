//! HTTP fetching
//!
//! Builds the shared HTTP client and fetches pages with content-type
//! checking. Redirects follow reqwest's default policy; the final response
//! is what gets analyzed.

use crate::crawler::CrawlError;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;

/// Builds the HTTP client shared by the crawler and analyzers
///
/// # Example
///
/// ```no_run
/// use sitelens::crawler::build_http_client;
///
/// let client = build_http_client("Sitelens/1.0 (+https://example.com/bot; admin@example.com)").unwrap();
/// ```
pub fn build_http_client(user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a page and returns its HTML body
///
/// Fails on network errors, non-success status codes, and non-HTML
/// content types (responses without a Content-Type header are accepted).
pub async fn fetch_html(client: &Client, url: &str) -> Result<String, CrawlError> {
    let response = client.get(url).send().await.map_err(|e| CrawlError::Fetch {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(CrawlError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();

    if !content_type.is_empty() && !content_type.contains("text/html") {
        return Err(CrawlError::ContentMismatch {
            url: url.to_string(),
            content_type,
        });
    }

    response.text().await.map_err(|e| CrawlError::Fetch {
        url: url.to_string(),
        message: e.to_string(),
    })
}
