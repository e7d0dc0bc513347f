//! Sitelens: a website analysis pipeline
//!
//! This crate implements the scan orchestration service behind Sitelens:
//! a bounded-concurrency job queue, a worker pipeline that crawls a bounded
//! set of pages and runs named analyzers over each one, exponential-backoff
//! retry, and progress reporting back to the submitting client.

pub mod analyzer;
pub mod config;
pub mod crawler;
pub mod job;
pub mod queue;
pub mod storage;
pub mod url;
pub mod worker;

use thiserror::Error;

/// Main error type for Sitelens operations
#[derive(Debug, Error)]
pub enum SitelensError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Queue error: {0}")]
    Queue(#[from] queue::QueueError),

    #[error("Crawl error: {0}")]
    Crawl(#[from] crawler::CrawlError),

    #[error("Analyzer error: {0}")]
    Analyzer(#[from] analyzer::AnalyzerError),

    #[error("Storage error: {0}")]
    Store(#[from] storage::StoreError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,

    #[error("Target not allowed: {0}")]
    Blocked(String),
}

/// Result type alias for Sitelens operations
pub type Result<T> = std::result::Result<T, SitelensError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use analyzer::{Analyzer, AnalyzerRegistry};
pub use config::Config;
pub use crawler::{CrawlBounds, PageCrawler, SiteCrawler};
pub use job::{Job, JobState, ScanOptions, ScanPayload};
pub use queue::{JobDispatch, RetryPolicy, ScanQueue};
pub use storage::{ScanStore, SqliteStore};
pub use worker::{ProgressReporter, ScanReport, WorkerContext};
