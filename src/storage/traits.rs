//! Storage trait and error types

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Fields written to a scan's live status row
#[derive(Debug, Clone, Default)]
pub struct StatusUpdate {
    /// Current step name or terminal state
    pub status: String,

    /// Progress percentage, 0-100
    pub progress: u8,

    /// Set on failure; an absent value keeps the stored message
    pub error_message: Option<String>,

    /// Set once the crawl step knows the page count
    pub pages_crawled: Option<u32>,
}

/// One scan's current status row
#[derive(Debug, Clone)]
pub struct ScanRow {
    pub job_id: String,
    pub status: String,
    pub progress: u8,
    pub error_message: Option<String>,
    pub pages_crawled: Option<u32>,
    pub updated_at: String,
}

/// One stored result record
#[derive(Debug, Clone)]
pub struct ResultRow {
    pub result_type: String,
    pub page_url: Option<String>,
    pub data: Value,
}

/// Persistence collaborator contract
///
/// `save_result` calls are part of the persist contract and fail the
/// attempt on error; `update_status` writes are best-effort from the
/// worker's perspective.
#[async_trait]
pub trait ScanStore: Send + Sync {
    /// Stores one result record: a per-page analyzer outcome or the final
    /// aggregate (`page_url` absent)
    async fn save_result(
        &self,
        job_id: &str,
        result_type: &str,
        data: &Value,
        page_url: Option<&str>,
    ) -> StoreResult<()>;

    /// Upserts the scan's live status row
    async fn update_status(&self, job_id: &str, update: &StatusUpdate) -> StoreResult<()>;

    /// Reads the scan's status row
    async fn get_scan(&self, job_id: &str) -> StoreResult<Option<ScanRow>>;

    /// Reads all stored results for a scan in insertion order
    async fn list_results(&self, job_id: &str) -> StoreResult<Vec<ResultRow>>;
}
