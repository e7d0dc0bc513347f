//! Scan queue implementation
//!
//! Admission is single-pointed: every path that frees or adds capacity ends
//! in `admit_locked`, which runs under the queue lock, so the number of
//! processing jobs never exceeds the configured capacity even under bursty
//! submission. Retried jobs re-enter at the front of the pending list so a
//! failing job is retried promptly rather than starved behind new arrivals.

use crate::config::QueueConfig;
use crate::job::{Job, JobState, ScanPayload};
use crate::queue::RetryPolicy;
use crate::url::validate_target;
use crate::worker::ScanReport;
use chrono::Utc;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

/// Terminal jobs retained for status queries
const HISTORY_LIMIT: usize = 256;

/// Errors surfaced to the submitter at enqueue time
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("A job with id '{0}' is already live")]
    Duplicate(String),

    #[error("Invalid target URL: {0}")]
    Url(#[from] crate::UrlError),

    #[error("Invalid scan options: {0}")]
    Options(#[from] crate::job::InvalidOptions),
}

/// A job admitted for processing, handed to the worker loop
#[derive(Debug, Clone)]
pub struct JobDispatch {
    pub id: String,
    pub payload: ScanPayload,
    /// 1-based attempt number for this dispatch
    pub attempt: u32,
}

/// Read-only snapshot of one job's lifecycle state
#[derive(Debug, Clone)]
pub struct JobStatus {
    pub id: String,
    pub state: JobState,
    pub attempts: u32,
    /// 0-based index in the pending list while `Queued`; absent otherwise,
    /// including while a retry timer holds the job out of the list
    pub position: Option<usize>,
    pub last_error: Option<String>,
    pub result: Option<ScanReport>,
}

/// Counts reported by [`ScanQueue::summary`]
#[derive(Debug, Clone, Copy)]
pub struct QueueSummary {
    pub queued: usize,
    pub processing: usize,
    pub capacity: usize,
}

/// Bounded-concurrency job queue for scan requests
///
/// Constructed once at process start and shared by reference; there is no
/// global instance. The receiver returned by [`ScanQueue::new`] is the
/// "job ready" side of the queue/worker contract: admitted jobs arrive on
/// it and the worker reports outcomes back through [`ScanQueue::report_success`]
/// and [`ScanQueue::report_failure`].
pub struct ScanQueue {
    inner: Mutex<QueueInner>,
    dispatch_tx: mpsc::UnboundedSender<JobDispatch>,
    retry_tx: mpsc::UnboundedSender<(String, Duration)>,
    capacity: usize,
    max_attempts: u32,
    retry: RetryPolicy,
}

#[derive(Default)]
struct QueueInner {
    /// FIFO of queued job ids; retries are pushed to the front
    pending: VecDeque<String>,
    /// Ids currently held by workers
    processing: HashSet<String>,
    /// Live jobs plus a bounded terminal history
    jobs: HashMap<String, Job>,
    /// Terminal ids in retirement order, oldest first
    history: VecDeque<String>,
}

impl QueueInner {
    /// Moves a terminal job into the bounded history, evicting the oldest
    /// records beyond the limit
    fn retire(&mut self, id: &str) {
        self.history.push_back(id.to_string());
        while self.history.len() > HISTORY_LIMIT {
            if let Some(old) = self.history.pop_front() {
                self.jobs.remove(&old);
            }
        }
    }
}

impl ScanQueue {
    /// Creates a queue and the dispatch receiver for the worker loop
    ///
    /// Must be called inside a Tokio runtime: the queue spawns a task that
    /// turns retry delays into delayed re-admissions.
    pub fn new(config: &QueueConfig) -> (Arc<Self>, mpsc::UnboundedReceiver<JobDispatch>) {
        let (dispatch_tx, dispatch_rx) = mpsc::unbounded_channel();
        let (retry_tx, mut retry_rx) = mpsc::unbounded_channel::<(String, Duration)>();

        let queue = Arc::new(Self {
            inner: Mutex::new(QueueInner::default()),
            dispatch_tx,
            retry_tx,
            capacity: config.capacity as usize,
            max_attempts: config.max_attempts,
            retry: RetryPolicy::new(config.retry_jitter),
        });

        // Retry timer loop: each message schedules one delayed re-admission.
        // Holding only a weak reference lets the loop end when the queue is
        // dropped.
        let weak = Arc::downgrade(&queue);
        tokio::spawn(async move {
            while let Some((id, delay)) = retry_rx.recv().await {
                let Some(queue) = weak.upgrade() else { break };
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    queue.readmit(&id);
                });
            }
        });

        (queue, dispatch_rx)
    }

    /// Submits a scan request
    ///
    /// Validates the target URL and option ranges before a job is created,
    /// so invalid submissions never enter the queue. A `None` id gets a
    /// generated UUID. Never blocks: admission happens through the dispatch
    /// channel.
    ///
    /// Enqueueing an id that is still live is rejected with
    /// [`QueueError::Duplicate`]; a terminal id may be reused, replacing its
    /// history record.
    pub fn enqueue(&self, id: Option<String>, payload: ScanPayload) -> Result<Job, QueueError> {
        validate_target(&payload.target_url)?;
        payload.options.validate()?;

        let id = id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let mut inner = self.inner.lock().unwrap();

        if let Some(existing) = inner.jobs.get(&id) {
            if !existing.state.is_terminal() {
                return Err(QueueError::Duplicate(id));
            }
            inner.history.retain(|h| h != &id);
        }

        let job = Job::new(id.clone(), payload, self.max_attempts);
        inner.jobs.insert(id.clone(), job.clone());
        inner.pending.push_back(id.clone());
        tracing::debug!("Enqueued job {}", id);

        self.admit_locked(&mut inner);

        Ok(job)
    }

    /// Cancels a job that is still queued
    ///
    /// Returns true only when the job was `Queued` (in the pending list or
    /// waiting on a retry timer) and is now `Cancelled`. Jobs already
    /// processing cannot be cancelled; there is no cooperative cancellation
    /// signal threaded through the collaborator calls.
    pub fn cancel(&self, id: &str) -> bool {
        let mut inner = self.inner.lock().unwrap();

        match inner.jobs.get(id) {
            None => {
                tracing::debug!("Cancel requested for unknown job {}", id);
                return false;
            }
            Some(job) if job.state != JobState::Queued => {
                tracing::debug!("Cancel requested for job {} in state {}", id, job.state);
                return false;
            }
            Some(_) => {}
        }

        if let Some(job) = inner.jobs.get_mut(id) {
            job.state = JobState::Cancelled;
        }
        inner.pending.retain(|p| p != id);
        inner.retire(id);
        tracing::info!("Job {} cancelled", id);

        true
    }

    /// Read-only snapshot of one job, or None if it was never seen (or has
    /// aged out of the terminal history)
    pub fn status(&self, id: &str) -> Option<JobStatus> {
        let inner = self.inner.lock().unwrap();
        let job = inner.jobs.get(id)?;

        let position = if job.state == JobState::Queued {
            inner.pending.iter().position(|p| p == id)
        } else {
            None
        };

        Some(JobStatus {
            id: job.id.clone(),
            state: job.state,
            attempts: job.attempts,
            position,
            last_error: job.last_error.clone(),
            result: job.result.clone(),
        })
    }

    /// Current queue counts
    pub fn summary(&self) -> QueueSummary {
        let inner = self.inner.lock().unwrap();
        QueueSummary {
            queued: inner.pending.len(),
            processing: inner.processing.len(),
            capacity: self.capacity,
        }
    }

    /// Worker back-call: the attempt finished successfully
    ///
    /// Ignored with a warning when the job is not currently processing
    /// (unknown id, double report, or report after a terminal transition);
    /// these calls originate from asynchronous tasks with nothing actionable
    /// to propagate to.
    pub fn report_success(&self, id: &str, result: ScanReport) {
        let mut inner = self.inner.lock().unwrap();

        if !inner.processing.remove(id) {
            tracing::warn!("report_success for job {} that is not processing, ignoring", id);
            return;
        }

        match inner.jobs.get_mut(id) {
            Some(job) => {
                job.state = JobState::Completed;
                job.completed_at = Some(Utc::now());
                job.result = Some(result);
                tracing::info!("Job {} completed (attempt {})", id, job.attempts);
            }
            None => {
                tracing::warn!("report_success for job {} with no record", id);
                return;
            }
        }

        inner.retire(id);
        self.admit_locked(&mut inner);
    }

    /// Worker back-call: the attempt failed
    ///
    /// Applies the retry policy: with attempts left, the job goes back to
    /// `Queued` and a timer re-inserts it at the front of the pending list
    /// after the backoff delay; otherwise it reaches terminal `Failed`.
    /// Either way the freed slot is refilled immediately.
    pub fn report_failure(&self, id: &str, error: &str) {
        let mut inner = self.inner.lock().unwrap();

        if !inner.processing.remove(id) {
            tracing::warn!("report_failure for job {} that is not processing, ignoring", id);
            return;
        }

        let will_retry = match inner.jobs.get_mut(id) {
            Some(job) => {
                job.last_error = Some(error.to_string());
                let will_retry = self.retry.should_retry(job.attempts, job.max_attempts);

                if will_retry {
                    job.state = JobState::Queued;
                    let delay = self.retry.backoff(job.attempts);
                    tracing::info!(
                        "Job {} attempt {} failed, retrying in {:?}: {}",
                        id,
                        job.attempts,
                        delay,
                        error
                    );
                    // Delayed re-admission; the send only fails once the
                    // queue itself is being torn down.
                    let _ = self.retry_tx.send((id.to_string(), delay));
                } else {
                    job.state = JobState::Failed;
                    job.failed_at = Some(Utc::now());
                    tracing::warn!(
                        "Job {} failed permanently after {} attempts: {}",
                        id,
                        job.attempts,
                        error
                    );
                }

                will_retry
            }
            None => {
                tracing::warn!("report_failure for job {} with no record", id);
                return;
            }
        };

        if !will_retry {
            inner.retire(id);
        }

        self.admit_locked(&mut inner);
    }

    /// Re-inserts a retry-pending job at the front of the pending list once
    /// its backoff timer fires
    ///
    /// A no-op when the job was cancelled (or otherwise left `Queued`)
    /// during the backoff window.
    fn readmit(&self, id: &str) {
        let mut inner = self.inner.lock().unwrap();

        match inner.jobs.get(id) {
            None => {
                tracing::debug!("Retry timer fired for unknown job {}", id);
                return;
            }
            Some(job) if job.state != JobState::Queued => {
                tracing::debug!(
                    "Retry timer fired for job {} in state {}, dropping",
                    id,
                    job.state
                );
                return;
            }
            Some(_) => {}
        }

        if inner.pending.iter().any(|p| p == id) {
            return;
        }

        inner.pending.push_front(id.to_string());
        tracing::debug!("Job {} re-admitted to the front of the queue", id);
        self.admit_locked(&mut inner);
    }

    /// The sole admission point: pops the pending head into the processing
    /// set while there is capacity, stamping attempt bookkeeping and handing
    /// the job to the worker loop
    ///
    /// Runs under the queue lock; the dispatch send is non-blocking.
    fn admit_locked(&self, inner: &mut QueueInner) {
        while inner.processing.len() < self.capacity {
            let Some(id) = inner.pending.pop_front() else {
                break;
            };

            let dispatch = match inner.jobs.get_mut(&id) {
                Some(job) if job.state == JobState::Queued => {
                    job.state = JobState::Processing;
                    job.attempts += 1;
                    job.started_at = Some(Utc::now());
                    JobDispatch {
                        id: id.clone(),
                        payload: job.payload.clone(),
                        attempt: job.attempts,
                    }
                }
                Some(job) => {
                    tracing::warn!("Skipping pending job {} in state {}", id, job.state);
                    continue;
                }
                None => {
                    tracing::warn!("Pending job {} has no record, dropping", id);
                    continue;
                }
            };

            inner.processing.insert(id.clone());
            tracing::info!("Job {} admitted (attempt {})", id, dispatch.attempt);

            if self.dispatch_tx.send(dispatch).is_err() {
                tracing::error!("Worker channel closed, failing job {}", id);
                inner.processing.remove(&id);
                if let Some(job) = inner.jobs.get_mut(&id) {
                    job.state = JobState::Failed;
                    job.failed_at = Some(Utc::now());
                    job.last_error = Some("worker loop unavailable".to_string());
                }
                inner.retire(&id);
            }
        }
    }
}
