use herald_channels::ChannelError;
use teloxide::{ApiError, RequestError};

/// Errors produced by the Telegram adapter.
#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    #[error("teloxide error: {0}")]
    Teloxide(#[from] RequestError),

    #[error("no bot token configured")]
    NoToken,

    /// Neither a numeric chat id nor an `@channel` username.
    #[error("invalid chat id: {0:?}")]
    InvalidChatId(String),

    #[error("no channel configured for distribution posts")]
    NoChannel,
}

impl From<TelegramError> for ChannelError {
    fn from(e: TelegramError) -> Self {
        match e {
            TelegramError::NoToken | TelegramError::NoChannel => ChannelError::NotConfigured(e.to_string()),
            TelegramError::InvalidChatId(_) => ChannelError::SendFailed(e.to_string()),
            TelegramError::Teloxide(RequestError::RetryAfter(secs)) => ChannelError::RateLimited {
                retry_after_secs: Some(secs.seconds() as u64),
            },
            TelegramError::Teloxide(RequestError::Api(ApiError::InvalidToken)) => ChannelError::AuthFailed(e.to_string()),
            TelegramError::Teloxide(RequestError::Api(api)) => ChannelError::SendFailed(api.to_string()),
            TelegramError::Teloxide(other) => ChannelError::Http(other.to_string()),
        }
    }
}
