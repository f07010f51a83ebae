use chrono::{DateTime, Utc};
use herald_core::types::{PlatformId, PlatformResult, PostContent};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a queue item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    /// Waiting for its `scheduled_at` (first attempt or retry).
    Pending,
    /// Claimed by a worker; platform posts in flight.
    Processing,
    /// Every target platform accepted the post.
    Posted,
    /// Some platforms accepted the post, some did not. Not retried.
    Partial,
    /// Every platform failed on the last allowed attempt.
    Failed,
}

impl QueueStatus {
    pub const ALL: [QueueStatus; 5] = [
        QueueStatus::Pending,
        QueueStatus::Processing,
        QueueStatus::Posted,
        QueueStatus::Partial,
        QueueStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueueStatus::Pending => "pending",
            QueueStatus::Processing => "processing",
            QueueStatus::Posted => "posted",
            QueueStatus::Partial => "partial",
            QueueStatus::Failed => "failed",
        }
    }

    /// No automatic transition leaves these states.
    pub fn is_terminal(&self) -> bool {
        matches!(self, QueueStatus::Posted | QueueStatus::Partial | QueueStatus::Failed)
    }
}

impl std::fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for QueueStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(QueueStatus::Pending),
            "processing" => Ok(QueueStatus::Processing),
            "posted" => Ok(QueueStatus::Posted),
            "partial" => Ok(QueueStatus::Partial),
            "failed" => Ok(QueueStatus::Failed),
            other => Err(format!("unknown queue status: {other}")),
        }
    }
}

/// A persisted queue item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem {
    /// UUID v7 string, sortable by creation time.
    pub id: String,
    pub title: String,
    pub content: String,
    pub link: Option<String>,
    pub hashtags: Vec<String>,
    /// Target platforms, duplicates removed, in submission order.
    pub platforms: Vec<PlatformId>,
    pub status: QueueStatus,
    /// Higher values are claimed first.
    pub priority: i64,
    /// All-failed passes so far.
    pub retry_count: u32,
    pub max_retries: u32,
    /// Not claimed before this instant (RFC 3339).
    pub scheduled_at: String,
    /// Every platform result from every pass, oldest first.
    pub results: Vec<PlatformResult>,
    pub last_error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    /// First pass with at least one successful platform.
    pub posted_at: Option<String>,
}

impl QueueItem {
    pub fn post_content(&self) -> PostContent {
        PostContent {
            title: self.title.clone(),
            content: self.content.clone(),
            link: self.link.clone(),
            hashtags: self.hashtags.clone(),
        }
    }
}

/// Enqueue request. Wire: `{title, content, platforms[], link?, hashtags?, scheduledAt?, priority?, maxRetries?}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub platforms: Vec<PlatformId>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub hashtags: Vec<String>,
    /// Defaults to now.
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: i64,
    /// Defaults to the configured `default_max_retries`.
    #[serde(default)]
    pub max_retries: Option<u32>,
}

/// Summary of one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Items claimed and dispatched.
    pub processed: usize,
    pub posted: usize,
    pub partial: usize,
    pub failed: usize,
    /// Items that failed everywhere and went back to `pending`.
    pub retried: usize,
}

impl BatchReport {
    pub fn record(&mut self, status: QueueStatus) {
        match status {
            QueueStatus::Posted => self.posted += 1,
            QueueStatus::Partial => self.partial += 1,
            QueueStatus::Failed => self.failed += 1,
            QueueStatus::Pending => self.retried += 1,
            QueueStatus::Processing => {}
        }
    }
}

/// Number of items per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    pub pending: usize,
    pub processing: usize,
    pub posted: usize,
    pub partial: usize,
    pub failed: usize,
}
