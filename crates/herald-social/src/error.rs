use herald_channels::ChannelError;
use herald_core::types::PlatformId;
use thiserror::Error;

/// Errors from the social network HTTP APIs.
#[derive(Debug, Error)]
pub enum SocialError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// 401/403 or a token-specific API error code.
    #[error("{platform} rejected credentials: {message}")]
    Auth { platform: PlatformId, message: String },

    #[error("{platform} rate limited")]
    RateLimited {
        platform: PlatformId,
        retry_after_secs: Option<u64>,
    },

    /// Any other non-success response.
    #[error("{platform} API error {status}: {message}")]
    Api {
        platform: PlatformId,
        status: u16,
        message: String,
    },

    /// A success response without the expected fields.
    #[error("unexpected {platform} response: {message}")]
    Parse { platform: PlatformId, message: String },
}

impl From<SocialError> for ChannelError {
    fn from(e: SocialError) -> Self {
        match e {
            SocialError::Http(e) => ChannelError::Http(e.to_string()),
            SocialError::Auth { .. } => ChannelError::AuthFailed(e.to_string()),
            SocialError::RateLimited { retry_after_secs, .. } => ChannelError::RateLimited { retry_after_secs },
            SocialError::Api { .. } | SocialError::Parse { .. } => ChannelError::SendFailed(e.to_string()),
        }
    }
}

/// Parse a `retry-after` header given in seconds.
pub(crate) fn retry_after_secs(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}

/// Bodies can be large HTML error pages; keep log lines and stored errors short.
pub(crate) fn truncate(body: &str, max: usize) -> String {
    if body.chars().count() <= max {
        return body.to_string();
    }
    let mut out: String = body.chars().take(max).collect();
    out.push('…');
    out
}
