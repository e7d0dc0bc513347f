//! Worker pipeline
//!
//! Workers receive admitted jobs from the queue's dispatch channel and drive
//! each one through the scan stages: crawl, analyze, aggregate, persist,
//! finalize. The worker holds no retry logic; every attempt ends in exactly
//! one `report_success` or `report_failure` back-call to the queue.

mod aggregate;
mod pipeline;
mod progress;

pub use aggregate::{build_report, PageAnalysis, ScanReport, ScanSummary};
pub use pipeline::{process, spawn_workers, WorkerContext};
pub use progress::{ChannelReporter, LogReporter, ProgressEvent, ProgressReporter};

/// Minimal report for queue unit tests
#[cfg(test)]
pub fn test_report(scan_id: &str) -> ScanReport {
    build_report(scan_id, &[], std::collections::BTreeMap::new())
}
