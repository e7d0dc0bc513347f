//! Pipeline execution for a single job attempt
//!
//! Stage order per attempt: crawl, analyze (per analyzer, per page),
//! aggregate, persist, finalize. Crawl and persist errors fail the whole
//! attempt; individual page/analyzer failures are recorded in the result
//! and the pipeline continues. All collaborator errors are caught here and
//! routed through the queue's failure call; nothing escapes to the host.

use crate::analyzer::AnalyzerRegistry;
use crate::crawler::{CrawlBounds, PageCrawler};
use crate::queue::{JobDispatch, ScanQueue};
use crate::storage::{ScanStore, StatusUpdate};
use crate::worker::aggregate::{build_report, PageAnalysis, ScanReport};
use crate::worker::progress::ProgressReporter;
use crate::SitelensError;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

/// Progress percentage reported while crawling
const CRAWL_PERCENT: u8 = 9;

/// Analyzer progress advances linearly from this base
const ANALYZE_BASE: usize = 20;

/// ...across this span, so the last analyzer lands at 90%
const ANALYZE_SPAN: usize = 70;

const AGGREGATE_PERCENT: u8 = 92;
const PERSIST_PERCENT: u8 = 95;

/// Shared collaborator handles for worker tasks
pub struct WorkerContext {
    pub crawler: Arc<dyn PageCrawler>,
    pub registry: Arc<AnalyzerRegistry>,
    pub store: Arc<dyn ScanStore>,
    pub progress: Arc<dyn ProgressReporter>,
}

/// Receives admitted jobs from the queue and runs each through the pipeline
///
/// One task per job; concurrency is bounded upstream by the queue's
/// admission capacity, so this loop never throttles.
pub fn spawn_workers(
    queue: Arc<ScanQueue>,
    mut ready: UnboundedReceiver<JobDispatch>,
    ctx: Arc<WorkerContext>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(dispatch) = ready.recv().await {
            let queue = Arc::clone(&queue);
            let ctx = Arc::clone(&ctx);
            tokio::spawn(async move {
                process(queue, ctx, dispatch).await;
            });
        }
        tracing::debug!("Dispatch channel closed, worker loop exiting");
    })
}

/// Runs one attempt for a job and reports the outcome back to the queue
///
/// This is the only exit path for an attempt: success and failure both end
/// in exactly one queue back-call. Retry decisions belong to the queue.
pub async fn process(queue: Arc<ScanQueue>, ctx: Arc<WorkerContext>, dispatch: JobDispatch) {
    tracing::info!(
        "Processing job {} (attempt {}): {}",
        dispatch.id,
        dispatch.attempt,
        dispatch.payload.target_url
    );

    match run_attempt(&ctx, &dispatch).await {
        Ok(report) => {
            notify(&ctx, &dispatch.id, "completed", "Scan completed", 100, None).await;
            queue.report_success(&dispatch.id, report);
        }
        Err(e) => {
            let message = e.to_string();
            let update = StatusUpdate {
                status: "failed".to_string(),
                progress: 0,
                error_message: Some(message.clone()),
                pages_crawled: None,
            };
            if let Err(store_err) = ctx.store.update_status(&dispatch.id, &update).await {
                tracing::warn!("Status update for job {} failed: {}", dispatch.id, store_err);
            }
            queue.report_failure(&dispatch.id, &message);
        }
    }
}

/// Drives the scan stages for one attempt
async fn run_attempt(
    ctx: &WorkerContext,
    dispatch: &JobDispatch,
) -> Result<ScanReport, SitelensError> {
    let job_id = &dispatch.id;
    let options = &dispatch.payload.options;

    // Crawl. A failure here (invalid target, unreachable host) fails the
    // attempt; no partial crawl results are used.
    notify(
        ctx,
        job_id,
        "crawling",
        &format!("Crawling {}", dispatch.payload.target_url),
        CRAWL_PERCENT,
        None,
    )
    .await;

    let bounds = CrawlBounds::from(options);
    let pages = ctx.crawler.crawl(&dispatch.payload.target_url, &bounds).await?;
    tracing::info!("Job {}: crawled {} pages", job_id, pages.len());

    notify(
        ctx,
        job_id,
        "crawling",
        &format!("Crawled {} pages", pages.len()),
        CRAWL_PERCENT,
        Some(pages.len() as u32),
    )
    .await;

    // Analyze. Per-page failures become error entries; the scan proceeds.
    let names = ctx.registry.select(options.analyzers.as_deref());
    let total = names.len().max(1);
    let mut results: BTreeMap<String, Vec<PageAnalysis>> = BTreeMap::new();

    for (index, name) in names.iter().enumerate() {
        let mut entries = Vec::with_capacity(pages.len());

        match ctx.registry.get(name) {
            Some(analyzer) => {
                for page in &pages {
                    let entry = match analyzer.analyze(page).await {
                        Ok(data) => PageAnalysis::success(page, data),
                        Err(e) => {
                            tracing::warn!(
                                "Job {}: analyzer {} failed on {}: {}",
                                job_id,
                                name,
                                page,
                                e
                            );
                            PageAnalysis::failure(page, e.to_string())
                        }
                    };

                    // Individual results are persisted as they complete so
                    // external status queries see live data; these writes
                    // are part of the persistence contract and fail the
                    // attempt on error.
                    let value = serde_json::to_value(&entry)?;
                    ctx.store.save_result(job_id, name, &value, Some(page)).await?;

                    entries.push(entry);
                }
            }
            None => {
                // Submission-side validation filters unknown names; a stray
                // one is recorded per page rather than aborting the attempt
                tracing::warn!("Job {}: unknown analyzer '{}'", job_id, name);
                for page in &pages {
                    entries.push(PageAnalysis::failure(
                        page,
                        format!("unknown analyzer: {}", name),
                    ));
                }
            }
        }

        results.insert(name.clone(), entries);

        let percent = (ANALYZE_BASE + (index + 1) * ANALYZE_SPAN / total) as u8;
        notify(
            ctx,
            job_id,
            "analyzing",
            &format!("Finished analyzer {}", name),
            percent,
            None,
        )
        .await;
    }

    // Aggregate. Pure, synchronous combination.
    notify(ctx, job_id, "aggregating", "Combining results", AGGREGATE_PERCENT, None).await;
    let report = build_report(job_id, &pages, results);

    // Persist the aggregate. The job is not done if its results cannot be
    // stored.
    notify(ctx, job_id, "persisting", "Storing scan report", PERSIST_PERCENT, None).await;
    let value = serde_json::to_value(&report)?;
    ctx.store.save_result(job_id, "aggregate", &value, None).await?;

    Ok(report)
}

/// Best-effort step notification: progress reporter plus a status row write.
/// Neither may fail the pipeline.
async fn notify(
    ctx: &WorkerContext,
    job_id: &str,
    step: &str,
    message: &str,
    percent: u8,
    pages_crawled: Option<u32>,
) {
    ctx.progress.report(job_id, step, message, percent);

    let update = StatusUpdate {
        status: step.to_string(),
        progress: percent,
        error_message: None,
        pages_crawled,
    };
    if let Err(e) = ctx.store.update_status(job_id, &update).await {
        tracing::warn!("Status update for job {} failed: {}", job_id, e);
    }
}
