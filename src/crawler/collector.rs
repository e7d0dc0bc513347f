//! Site crawler implementation
//!
//! Breadth-first crawl from the target URL, restricted to the target's
//! host, bounded by the scan's page and depth limits, de-duplicated via
//! URL normalization. Only a failure on the target page itself fails the
//! crawl; discovered pages that fail to fetch just stop expanding.

use crate::crawler::sitemap::fetch_sitemap_urls;
use crate::crawler::{fetch_html, parse_page, CrawlBounds, CrawlError, PageCrawler};
use crate::url::{normalize_url, validate_target};
use crate::UrlError;
use async_trait::async_trait;
use reqwest::Client;
use robotstxt::DefaultMatcher;
use std::collections::{HashSet, VecDeque};
use url::Url;

pub struct SiteCrawler {
    client: Client,
    /// User-agent token matched against robots.txt groups
    agent: String,
    allow_private: bool,
}

impl SiteCrawler {
    pub fn new(client: Client, agent: impl Into<String>) -> Self {
        Self {
            client,
            agent: agent.into(),
            allow_private: false,
        }
    }

    /// Permits loopback and private-range scan targets
    ///
    /// Off in production; intended for scans against staging hosts and for
    /// tests driving a local mock server.
    pub fn allow_private_targets(mut self, allow: bool) -> Self {
        self.allow_private = allow;
        self
    }

    async fn fetch_robots(&self, root: &Url) -> Option<String> {
        let robots_url = root.join("/robots.txt").ok()?;
        match self.client.get(robots_url.as_str()).send().await {
            Ok(response) if response.status().is_success() => response.text().await.ok(),
            Ok(response) => {
                tracing::debug!("No robots.txt at {} (HTTP {})", robots_url, response.status());
                None
            }
            Err(e) => {
                tracing::debug!("Failed to fetch robots.txt {}: {}", robots_url, e);
                None
            }
        }
    }
}

#[async_trait]
impl PageCrawler for SiteCrawler {
    async fn crawl(
        &self,
        target_url: &str,
        bounds: &CrawlBounds,
    ) -> Result<Vec<String>, CrawlError> {
        let root = if self.allow_private {
            Url::parse(target_url).map_err(|e| UrlError::Parse(e.to_string()))?
        } else {
            validate_target(target_url)?
        };

        let root = normalize_url(root.as_str())?;
        let host = root.host_str().ok_or(UrlError::MissingHost)?.to_string();

        let robots = if bounds.respect_robots_txt {
            self.fetch_robots(&root).await
        } else {
            None
        };

        let mut visited: HashSet<String> = HashSet::new();
        let mut frontier: VecDeque<(Url, u32)> = VecDeque::new();
        let mut pages: Vec<String> = Vec::new();

        visited.insert(root.to_string());
        frontier.push_back((root.clone(), 0));

        if bounds.include_sitemap {
            for loc in fetch_sitemap_urls(&self.client, &root).await {
                let Ok(normalized) = normalize_url(&loc) else {
                    continue;
                };
                if normalized.host_str() != Some(host.as_str()) {
                    continue;
                }
                if visited.insert(normalized.to_string()) {
                    frontier.push_back((normalized, 1));
                }
            }
        }

        while let Some((url, depth)) = frontier.pop_front() {
            if pages.len() >= bounds.max_pages {
                break;
            }

            let url_str = url.to_string();
            let is_root = pages.is_empty() && depth == 0;

            if let Some(robots_body) = &robots {
                let mut matcher = DefaultMatcher::default();
                if !matcher.one_agent_allowed_by_robots(robots_body, &self.agent, &url_str) {
                    if is_root {
                        return Err(CrawlError::Fetch {
                            url: url_str,
                            message: "target disallowed by robots.txt".to_string(),
                        });
                    }
                    tracing::debug!("Skipping {} (disallowed by robots.txt)", url_str);
                    continue;
                }
            }

            let html = match fetch_html(&self.client, &url_str).await {
                Ok(html) => html,
                // The target page itself must be reachable
                Err(e) if is_root => return Err(e),
                Err(e) => {
                    tracing::debug!("Skipping {}: {}", url_str, e);
                    continue;
                }
            };

            pages.push(url_str);

            if depth >= bounds.max_depth || pages.len() >= bounds.max_pages {
                continue;
            }

            for link in parse_page(&html, &url).links {
                let Ok(normalized) = normalize_url(&link) else {
                    continue;
                };
                if normalized.host_str() != Some(host.as_str()) {
                    continue;
                }
                if visited.insert(normalized.to_string()) {
                    frontier.push_back((normalized, depth + 1));
                }
            }
        }

        tracing::info!("Crawled {} pages from {}", pages.len(), target_url);
        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> CrawlBounds {
        CrawlBounds {
            max_pages: 10,
            max_depth: 3,
            include_sitemap: false,
            respect_robots_txt: false,
        }
    }

    #[tokio::test]
    async fn test_rejects_invalid_target_without_network() {
        let crawler = SiteCrawler::new(Client::new(), "TestBot");

        let result = crawler.crawl("not a url", &bounds()).await;
        assert!(matches!(result, Err(CrawlError::Url(_))));
    }

    #[tokio::test]
    async fn test_rejects_private_target_by_default() {
        let crawler = SiteCrawler::new(Client::new(), "TestBot");

        let result = crawler.crawl("http://127.0.0.1/", &bounds()).await;
        assert!(matches!(result, Err(CrawlError::Url(UrlError::Blocked(_)))));
    }
}
