//! Bounded-concurrency job queue
//!
//! The [`ScanQueue`] owns admission control and lifecycle bookkeeping for
//! scan jobs: a FIFO pending list, a bounded processing set, retry with
//! exponential backoff, and a dispatch channel that hands admitted jobs to
//! the worker loop.

mod retry;
mod scan_queue;

pub use retry::RetryPolicy;
pub use scan_queue::{JobDispatch, JobStatus, QueueError, QueueSummary, ScanQueue};
