use thiserror::Error;

/// Errors that can occur within any platform adapter.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Credentials or target for the platform are missing.
    #[error("{0} is not configured")]
    NotConfigured(String),

    /// The content failed the adapter's pre-flight checks.
    #[error("Invalid content: {0}")]
    InvalidContent(String),

    /// The platform accepted the request but refused to publish.
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// The platform rejected the supplied credentials or token.
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// The platform throttled the request.
    #[error("Rate limited (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    /// An operation exceeded its allowed time budget.
    #[error("Operation timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// Transport-level failure (DNS, TLS, connection reset, bad JSON).
    #[error("HTTP error: {0}")]
    Http(String),
}
