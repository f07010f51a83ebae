//! Bot API `sendMessage` with HTML formatting and bounded retries.
//!
//! Recognised API errors (400 bad request, 403 bot blocked, 404 chat not
//! found) are returned at once. Flood control (`retry_after`) waits the time
//! Telegram asks for. Network failures and API errors teloxide cannot
//! classify (server-side 5xx among them) back off linearly.

use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::{ParseMode, Recipient};
use teloxide::{ApiError, RequestError};
use tracing::warn;

use crate::error::TelegramError;

/// Telegram's hard limit for one text message.
pub const MAX_MESSAGE_CHARS: usize = 4096;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub attempts: u32,
    /// Transient failures wait `base_delay * attempt`.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// How long to wait before the next attempt, or `None` to give up.
    pub fn delay_after(&self, err: &RequestError, attempt: u32) -> Option<Duration> {
        if attempt >= self.attempts {
            return None;
        }
        match err {
            RequestError::Api(ApiError::Unknown(_)) => Some(self.base_delay * attempt),
            RequestError::Api(_) | RequestError::MigrateToChatId(_) => None,
            RequestError::RetryAfter(secs) => Some(secs.duration()),
            _ => Some(self.base_delay * attempt),
        }
    }
}

/// Parse a chat reference: a (possibly negative) numeric id, or `@username`
/// for public channels.
pub fn parse_recipient(raw: &str) -> Result<Recipient, TelegramError> {
    let raw = raw.trim();
    if let Ok(id) = raw.parse::<i64>() {
        return Ok(Recipient::Id(ChatId(id)));
    }
    match raw.strip_prefix('@') {
        Some(name) if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') => {
            Ok(Recipient::ChannelUsername(raw.to_string()))
        }
        _ => Err(TelegramError::InvalidChatId(raw.to_string())),
    }
}

/// Escape text for interpolation into an HTML-mode message.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Send `html` to `recipient`, retrying transient failures per `policy`.
pub async fn send_html(
    bot: &Bot,
    recipient: &Recipient,
    html: &str,
    policy: &RetryPolicy,
) -> Result<Message, TelegramError> {
    let mut attempt = 1;
    loop {
        let sent = bot
            .send_message(recipient.clone(), html)
            .parse_mode(ParseMode::Html)
            .await;

        let err = match sent {
            Ok(message) => return Ok(message),
            Err(e) => e,
        };
        match policy.delay_after(&err, attempt) {
            Some(delay) => {
                warn!(
                    attempt,
                    max_attempts = policy.attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Telegram send failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            None => {
                warn!(attempt, error = %err, "Telegram send failed");
                return Err(err.into());
            }
        }
    }
}
