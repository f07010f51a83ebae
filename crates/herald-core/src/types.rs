use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// RFC 3339 UTC timestamp with fixed millisecond precision.
///
/// Fixed width keeps the strings lexicographically sortable, which the queue
/// relies on for `scheduled_at <= now` comparisons inside SQLite.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current time formatted with [`timestamp`].
pub fn now_timestamp() -> String {
    timestamp(Utc::now())
}

/// Audience of a live event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Back-office dashboards; see every booking.
    Admin,
    /// Customer chat widgets; usually scoped to one booking reference.
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Customer => "customer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = crate::error::HeraldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "customer" => Ok(Role::Customer),
            other => Err(crate::error::HeraldError::UnknownRole(other.to_string())),
        }
    }
}

/// External platform a queue item can be distributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformId {
    Twitter,
    Facebook,
    Telegram,
}

impl PlatformId {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformId::Twitter => "twitter",
            PlatformId::Facebook => "facebook",
            PlatformId::Telegram => "telegram",
        }
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PlatformId {
    type Err = crate::error::HeraldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "twitter" | "x" => Ok(PlatformId::Twitter),
            "facebook" => Ok(PlatformId::Facebook),
            "telegram" => Ok(PlatformId::Telegram),
            other => Err(crate::error::HeraldError::UnknownPlatform(other.to_string())),
        }
    }
}

/// The content of one distribution post, shared by every target platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostContent {
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hashtags: Vec<String>,
}

impl PostContent {
    /// Hashtags normalised to `#tag` form, space separated. Empty when none.
    pub fn hashtag_line(&self) -> String {
        self.hashtags
            .iter()
            .map(|t| t.trim().trim_start_matches('#'))
            .filter(|t| !t.is_empty())
            .map(|t| format!("#{t}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Body text followed by hashtags and link, each block separated by a
    /// blank line. Platforms that render links natively skip `link`.
    pub fn compose(&self, include_link: bool) -> String {
        let mut parts = vec![self.content.trim().to_string()];
        let tags = self.hashtag_line();
        if !tags.is_empty() {
            parts.push(tags);
        }
        if include_link {
            if let Some(link) = self.link.as_deref().filter(|l| !l.is_empty()) {
                parts.push(link.to_string());
            }
        }
        parts.join("\n\n")
    }
}

/// Outcome of one adapter invocation for one queue item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformResult {
    pub platform: PlatformId,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub posted_at: String,
}

impl PlatformResult {
    pub fn succeeded(platform: PlatformId, post_id: Option<String>, url: Option<String>) -> Self {
        Self {
            platform,
            success: true,
            post_id,
            url,
            error: None,
            posted_at: now_timestamp(),
        }
    }

    pub fn failed(platform: PlatformId, error: impl Into<String>) -> Self {
        Self {
            platform,
            success: false,
            post_id: None,
            url: None,
            error: Some(error.into()),
            posted_at: now_timestamp(),
        }
    }
}

/// Result of an adapter's pre-flight content check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn push_error(&mut self, error: impl Into<String>) {
        self.valid = false;
        self.errors.push(error.into());
    }

    pub fn push_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}
