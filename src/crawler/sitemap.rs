//! Sitemap seeding
//!
//! When a scan opts in, `/sitemap.xml` entries seed the crawl frontier
//! alongside link discovery. Fetching the sitemap is best-effort: a missing
//! or malformed sitemap just contributes nothing.

use regex::Regex;
use reqwest::Client;
use url::Url;

/// Fetches the target host's sitemap and returns its URL entries
pub async fn fetch_sitemap_urls(client: &Client, root: &Url) -> Vec<String> {
    let Ok(sitemap_url) = root.join("/sitemap.xml") else {
        return Vec::new();
    };

    let response = match client.get(sitemap_url.as_str()).send().await {
        Ok(response) if response.status().is_success() => response,
        Ok(response) => {
            tracing::debug!("No sitemap at {} (HTTP {})", sitemap_url, response.status());
            return Vec::new();
        }
        Err(e) => {
            tracing::debug!("Failed to fetch sitemap {}: {}", sitemap_url, e);
            return Vec::new();
        }
    };

    match response.text().await {
        Ok(body) => extract_locs(&body),
        Err(e) => {
            tracing::debug!("Failed to read sitemap {}: {}", sitemap_url, e);
            Vec::new()
        }
    }
}

/// Extracts `<loc>` entries from sitemap XML
fn extract_locs(xml: &str) -> Vec<String> {
    let re = Regex::new(r"<loc>\s*([^<]+?)\s*</loc>").expect("valid regex");
    re.captures_iter(xml).map(|c| c[1].to_string()).collect()
}
