use crate::job::{JobState, ScanOptions};
use crate::worker::ScanReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable submission payload for one scan request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanPayload {
    /// The website to scan
    pub target_url: String,

    /// Per-request options
    #[serde(default)]
    pub options: ScanOptions,
}

impl ScanPayload {
    pub fn new(target_url: impl Into<String>, options: ScanOptions) -> Self {
        Self {
            target_url: target_url.into(),
            options,
        }
    }
}

/// One user-submitted scan request and its lifecycle state
///
/// The queue exclusively owns `state`, `attempts`, and the timestamps; the
/// worker supplies `result` and `last_error` content through the queue's
/// completion and failure calls, never by mutating a job directly.
#[derive(Debug, Clone)]
pub struct Job {
    /// Opaque unique identifier, stable for the job's lifetime
    pub id: String,

    /// Immutable submission payload
    pub payload: ScanPayload,

    /// Current lifecycle state
    pub state: JobState,

    /// Processing attempts started so far
    pub attempts: u32,

    /// Fixed attempt cap, set at construction
    pub max_attempts: u32,

    pub enqueued_at: DateTime<Utc>,

    /// Set on each admission; overwritten on retry
    pub started_at: Option<DateTime<Utc>>,

    pub completed_at: Option<DateTime<Utc>>,

    pub failed_at: Option<DateTime<Utc>>,

    /// Last failure message; overwritten on each failed attempt
    pub last_error: Option<String>,

    /// Set once, only on terminal `Completed`
    pub result: Option<ScanReport>,
}

impl Job {
    /// Constructs a freshly queued job
    pub fn new(id: String, payload: ScanPayload, max_attempts: u32) -> Self {
        Self {
            id,
            payload,
            state: JobState::Queued,
            attempts: 0,
            max_attempts,
            enqueued_at: Utc::now(),
            started_at: None,
            completed_at: None,
            failed_at: None,
            last_error: None,
            result: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_job_starts_queued() {
        let payload = ScanPayload::new("https://example.com", ScanOptions::default());
        let job = Job::new("job-1".to_string(), payload, 3);

        assert_eq!(job.state, JobState::Queued);
        assert_eq!(job.attempts, 0);
        assert_eq!(job.max_attempts, 3);
        assert!(job.started_at.is_none());
        assert!(job.result.is_none());
        assert!(job.last_error.is_none());
    }

    #[test]
    fn test_payload_deserializes_camel_case() {
        let payload: ScanPayload = serde_json::from_str(
            r#"{"targetUrl": "https://example.com", "options": {"maxPages": 2}}"#,
        )
        .unwrap();
        assert_eq!(payload.target_url, "https://example.com");
        assert_eq!(payload.options.max_pages, 2);
    }
}
