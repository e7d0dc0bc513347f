//! Site crawling
//!
//! The worker pipeline sees crawling through the narrow [`PageCrawler`]
//! contract: a target URL and bounds in, an ordered de-duplicated page list
//! out. [`SiteCrawler`] is the production implementation (same-host BFS
//! with optional sitemap seeding and robots.txt filtering).

mod collector;
mod fetcher;
mod parser;
mod sitemap;

pub use collector::SiteCrawler;
pub use fetcher::{build_http_client, fetch_html};
pub use parser::{parse_page, ParsedPage};

use crate::job::ScanOptions;
use async_trait::async_trait;
use thiserror::Error;

/// Errors that fail a crawl (and with it, the whole attempt)
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Invalid target URL: {0}")]
    Url(#[from] crate::UrlError),

    #[error("Failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Expected HTML at {url}, got {content_type}")]
    ContentMismatch { url: String, content_type: String },
}

/// Crawl limits derived from the job's scan options
#[derive(Debug, Clone)]
pub struct CrawlBounds {
    pub max_pages: usize,
    pub max_depth: u32,
    pub include_sitemap: bool,
    pub respect_robots_txt: bool,
}

impl From<&ScanOptions> for CrawlBounds {
    fn from(options: &ScanOptions) -> Self {
        Self {
            max_pages: options.max_pages as usize,
            max_depth: options.max_depth,
            include_sitemap: options.include_sitemap,
            respect_robots_txt: options.respect_robots_txt,
        }
    }
}

/// Crawl collaborator contract
///
/// Returns the ordered, de-duplicated list of page URLs to analyze. Errors
/// mean the attempt must fail; no partial crawl results are used.
#[async_trait]
pub trait PageCrawler: Send + Sync {
    async fn crawl(&self, target_url: &str, bounds: &CrawlBounds) -> Result<Vec<String>, CrawlError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_from_options() {
        let options = ScanOptions {
            max_pages: 25,
            max_depth: 2,
            include_sitemap: false,
            respect_robots_txt: true,
            analyzers: None,
        };

        let bounds = CrawlBounds::from(&options);
        assert_eq!(bounds.max_pages, 25);
        assert_eq!(bounds.max_depth, 2);
        assert!(!bounds.include_sitemap);
        assert!(bounds.respect_robots_txt);
    }
}
