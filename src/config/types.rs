use serde::Deserialize;

/// Main configuration structure for Sitelens
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Queue behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    /// Maximum number of jobs processing concurrently
    #[serde(default = "default_capacity")]
    pub capacity: u32,

    /// Processing attempts per job before it fails permanently
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Randomly extend retry backoff delays
    #[serde(rename = "retry-jitter", default)]
    pub retry_jitter: bool,
}

fn default_capacity() -> u32 {
    3
}

fn default_max_attempts() -> u32 {
    3
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            max_attempts: default_max_attempts(),
            retry_jitter: false,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the scanner
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the scanner
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the scanner
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for scanner-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value:
    /// `CrawlerName/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}
