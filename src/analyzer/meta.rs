//! Page metadata analyzer
//!
//! Reports the basic descriptive metadata of a page: title, meta
//! description, canonical URL, and heading count.

use crate::analyzer::{Analyzer, AnalyzerError};
use crate::crawler::{fetch_html, parse_page, CrawlError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use url::Url;

pub struct MetaAnalyzer {
    client: Client,
}

impl MetaAnalyzer {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Analyzer for MetaAnalyzer {
    fn name(&self) -> &str {
        "meta"
    }

    async fn analyze(&self, page_url: &str) -> Result<Value, AnalyzerError> {
        let html = fetch_html(&self.client, page_url).await.map_err(|e| match e {
            CrawlError::ContentMismatch { url, content_type } => {
                AnalyzerError::ContentMismatch { url, content_type }
            }
            other => AnalyzerError::Fetch {
                url: page_url.to_string(),
                message: other.to_string(),
            },
        })?;

        let base = Url::parse(page_url).map_err(|e| AnalyzerError::Analysis {
            url: page_url.to_string(),
            message: e.to_string(),
        })?;

        let parsed = parse_page(&html, &base);

        Ok(json!({
            "title": parsed.title,
            "description": parsed.description,
            "canonical": parsed.canonical,
            "headings": parsed.headings,
            "url": page_url,
        }))
    }
}
