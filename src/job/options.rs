use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default number of pages crawled per scan
pub const DEFAULT_MAX_PAGES: u32 = 10;

/// Upper bound on pages crawled per scan
pub const MAX_PAGES_LIMIT: u32 = 250;

/// Default crawl depth from the target URL
pub const DEFAULT_MAX_DEPTH: u32 = 3;

/// Upper bound on crawl depth
pub const MAX_DEPTH_LIMIT: u32 = 5;

/// Errors for out-of-range scan options, rejected at submission time
#[derive(Debug, Error)]
pub enum InvalidOptions {
    #[error("max_pages must be between 1 and 250, got {0}")]
    MaxPages(u32),

    #[error("max_depth must be between 1 and 5, got {0}")]
    MaxDepth(u32),
}

/// Per-request scan options, immutable once the job is enqueued
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanOptions {
    /// Maximum number of pages to crawl
    pub max_pages: u32,

    /// Maximum crawl depth from the target URL
    pub max_depth: u32,

    /// Seed the crawl frontier from sitemap.xml
    pub include_sitemap: bool,

    /// Honor robots.txt disallow rules during the crawl
    pub respect_robots_txt: bool,

    /// Analyzer names to run; None selects the registry's default set
    pub analyzers: Option<Vec<String>>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
            max_depth: DEFAULT_MAX_DEPTH,
            include_sitemap: true,
            respect_robots_txt: true,
            analyzers: None,
        }
    }
}

impl ScanOptions {
    /// Validates option ranges
    ///
    /// Called by the queue before a job is constructed, so out-of-range
    /// options never enter the pending list.
    pub fn validate(&self) -> Result<(), InvalidOptions> {
        if self.max_pages < 1 || self.max_pages > MAX_PAGES_LIMIT {
            return Err(InvalidOptions::MaxPages(self.max_pages));
        }

        if self.max_depth < 1 || self.max_depth > MAX_DEPTH_LIMIT {
            return Err(InvalidOptions::MaxDepth(self.max_depth));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ScanOptions::default();
        assert_eq!(options.max_pages, 10);
        assert_eq!(options.max_depth, 3);
        assert!(options.include_sitemap);
        assert!(options.respect_robots_txt);
        assert!(options.analyzers.is_none());
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_pages() {
        let options = ScanOptions {
            max_pages: 0,
            ..Default::default()
        };
        assert!(matches!(
            options.validate(),
            Err(InvalidOptions::MaxPages(0))
        ));

        let options = ScanOptions {
            max_pages: 251,
            ..Default::default()
        };
        assert!(matches!(
            options.validate(),
            Err(InvalidOptions::MaxPages(251))
        ));

        let options = ScanOptions {
            max_pages: 250,
            ..Default::default()
        };
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_depth() {
        let options = ScanOptions {
            max_depth: 0,
            ..Default::default()
        };
        assert!(matches!(options.validate(), Err(InvalidOptions::MaxDepth(0))));

        let options = ScanOptions {
            max_depth: 6,
            ..Default::default()
        };
        assert!(matches!(options.validate(), Err(InvalidOptions::MaxDepth(6))));
    }

    #[test]
    fn test_deserializes_camel_case_with_defaults() {
        let options: ScanOptions =
            serde_json::from_str(r#"{"maxPages": 5, "includeSitemap": false}"#).unwrap();
        assert_eq!(options.max_pages, 5);
        assert_eq!(options.max_depth, 3);
        assert!(!options.include_sitemap);
        assert!(options.respect_robots_txt);
    }
}
