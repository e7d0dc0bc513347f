//! Aggregate report construction
//!
//! Pure combination of per-analyzer, per-page outcomes into the single
//! report object a completed job carries. No I/O happens here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Outcome of one analyzer on one page
///
/// Exactly one of `data` and `error` is set: per-page failures are recorded
/// inline rather than aborting the scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageAnalysis {
    pub page: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PageAnalysis {
    pub fn success(page: impl Into<String>, data: Value) -> Self {
        Self {
            page: page.into(),
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(page: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            page: page.into(),
            data: None,
            error: Some(error.into()),
        }
    }

    /// True when the analyzer produced data for this page
    pub fn is_success(&self) -> bool {
        self.data.is_some()
    }
}

/// Headline counts for a completed scan
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSummary {
    pub total_pages: usize,
    pub analyzers_run: usize,
    pub timestamp: DateTime<Utc>,
}

/// Combined result of a completed scan
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub scan_id: String,
    pub summary: ScanSummary,
    /// Crawled page URLs in discovery order
    pub pages: Vec<String>,
    /// Analyzer name -> one entry per page
    pub results: BTreeMap<String, Vec<PageAnalysis>>,
}

/// Builds the aggregate report for a finished attempt
pub fn build_report(
    scan_id: &str,
    pages: &[String],
    results: BTreeMap<String, Vec<PageAnalysis>>,
) -> ScanReport {
    ScanReport {
        scan_id: scan_id.to_string(),
        summary: ScanSummary {
            total_pages: pages.len(),
            analyzers_run: results.len(),
            timestamp: Utc::now(),
        },
        pages: pages.to_vec(),
        results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_report_counts() {
        let pages = vec![
            "https://example.com/".to_string(),
            "https://example.com/about".to_string(),
        ];
        let mut results = BTreeMap::new();
        results.insert(
            "fonts".to_string(),
            vec![
                PageAnalysis::success(&pages[0], json!({"totalFonts": 2})),
                PageAnalysis::failure(&pages[1], "timed out"),
            ],
        );

        let report = build_report("scan-1", &pages, results);

        assert_eq!(report.scan_id, "scan-1");
        assert_eq!(report.summary.total_pages, 2);
        assert_eq!(report.summary.analyzers_run, 1);
        assert_eq!(report.pages, pages);

        let fonts = &report.results["fonts"];
        assert!(fonts[0].is_success());
        assert!(!fonts[1].is_success());
        assert_eq!(fonts[1].error.as_deref(), Some("timed out"));
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let report = build_report("scan-2", &["https://example.com/".to_string()], {
            let mut results = BTreeMap::new();
            results.insert(
                "meta".to_string(),
                vec![PageAnalysis::success(
                    "https://example.com/",
                    json!({"title": "Example"}),
                )],
            );
            results
        });

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["scanId"], "scan-2");
        assert_eq!(value["summary"]["totalPages"], 1);
        assert_eq!(value["summary"]["analyzersRun"], 1);
        assert_eq!(value["results"]["meta"][0]["data"]["title"], "Example");
        // Error key is omitted on success entries
        assert!(value["results"]["meta"][0].get("error").is_none());
    }

    #[test]
    fn test_empty_report() {
        let report = build_report("scan-3", &[], BTreeMap::new());
        assert_eq!(report.summary.total_pages, 0);
        assert_eq!(report.summary.analyzers_run, 0);
        assert!(report.pages.is_empty());
    }
}
