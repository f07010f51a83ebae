//! Telegram platform adapter.
//!
//! Posts distribution items to the configured channel and fans admin alerts
//! out to every admin chat. Outbound only; the bot does not poll for updates.

use async_trait::async_trait;
use futures_util::future::join_all;
use herald_channels::{platform::check_length, ChannelError, Platform, PostReceipt};
use herald_core::config::TelegramConfig;
use herald_core::types::{PlatformId, PostContent, ValidationResult};
use serde::Serialize;
use teloxide::prelude::*;
use teloxide::types::Recipient;
use tracing::{info, warn};

use crate::error::TelegramError;
use crate::send::{escape_html, parse_recipient, send_html, RetryPolicy, MAX_MESSAGE_CHARS};

/// Outcome of [`TelegramPlatform::notify_admins`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AdminAlertReport {
    pub sent: usize,
    pub failed: usize,
    pub errors: Vec<AdminAlertError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminAlertError {
    pub chat_id: String,
    pub error: String,
}

pub struct TelegramPlatform {
    bot: Option<Bot>,
    config: Option<TelegramConfig>,
    retry: RetryPolicy,
}

impl TelegramPlatform {
    pub fn new(config: Option<TelegramConfig>) -> Self {
        let bot = config
            .as_ref()
            .map(|c| c.bot_token.trim())
            .filter(|t| !t.is_empty())
            .map(Bot::new);
        Self {
            bot,
            config,
            retry: RetryPolicy::default(),
        }
    }

    /// Channel post body: bold title, escaped content, hashtags and link.
    pub fn message_html(content: &PostContent) -> String {
        let mut parts = Vec::new();
        if !content.title.trim().is_empty() {
            parts.push(format!("<b>{}</b>", escape_html(content.title.trim())));
        }
        parts.push(escape_html(&content.compose(true)));
        parts.join("\n\n")
    }

    /// The message as Telegram counts it: entities parsed, markup gone.
    pub fn visible_text(content: &PostContent) -> String {
        let body = content.compose(true);
        match content.title.trim() {
            "" => body,
            title => format!("{title}\n\n{body}"),
        }
    }

    fn channel(&self) -> Option<&str> {
        self.config
            .as_ref()
            .and_then(|c| c.channel_id.as_deref())
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    pub fn dashboard_url(&self) -> Option<&str> {
        self.config.as_ref().and_then(|c| c.dashboard_url.as_deref())
    }

    pub fn admin_chat_ids(&self) -> Vec<String> {
        self.config
            .as_ref()
            .map(|c| {
                c.admin_chat_ids
                    .iter()
                    .map(|id| id.trim().to_string())
                    .filter(|id| !id.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Send one HTML message to every admin chat concurrently.
    ///
    /// Never fails as a whole: each chat's outcome is counted in the report.
    pub async fn notify_admins(&self, html: &str) -> AdminAlertReport {
        let chat_ids = self.admin_chat_ids();
        if chat_ids.is_empty() {
            warn!("no Telegram admin chat ids configured, skipping alert");
            return AdminAlertReport::default();
        }

        let sends = chat_ids.iter().map(|chat_id| async move {
            let outcome = match &self.bot {
                None => Err(TelegramError::NoToken),
                Some(bot) => match parse_recipient(chat_id) {
                    Ok(recipient) => send_html(bot, &recipient, html, &self.retry).await.map(|_| ()),
                    Err(e) => Err(e),
                },
            };
            (chat_id.clone(), outcome)
        });

        let mut report = AdminAlertReport::default();
        for (chat_id, outcome) in join_all(sends).await {
            match outcome {
                Ok(()) => report.sent += 1,
                Err(e) => {
                    report.failed += 1;
                    report.errors.push(AdminAlertError {
                        chat_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            sent = report.sent,
            failed = report.failed,
            total = chat_ids.len(),
            "Telegram admin alert delivered"
        );
        if !report.errors.is_empty() {
            warn!(errors = ?report.errors, "Telegram admin alert errors");
        }
        report
    }

    async fn post_to_channel(&self, content: &PostContent) -> Result<PostReceipt, TelegramError> {
        let bot = self.bot.as_ref().ok_or(TelegramError::NoToken)?;
        let channel = self.channel().ok_or(TelegramError::NoChannel)?;
        let recipient = parse_recipient(channel)?;

        let message = send_html(bot, &recipient, &Self::message_html(content), &self.retry).await?;
        let url = match &recipient {
            Recipient::ChannelUsername(name) => Some(format!(
                "https://t.me/{}/{}",
                name.trim_start_matches('@'),
                message.id.0
            )),
            Recipient::Id(_) => None,
        };
        Ok(PostReceipt {
            post_id: Some(message.id.0.to_string()),
            url,
        })
    }
}

#[async_trait]
impl Platform for TelegramPlatform {
    fn id(&self) -> PlatformId {
        PlatformId::Telegram
    }

    fn is_configured(&self) -> bool {
        self.bot.is_some() && self.channel().is_some()
    }

    fn validate_content(&self, content: &PostContent) -> ValidationResult {
        let mut result = ValidationResult::ok();
        check_length(
            &mut result,
            &Self::visible_text(content),
            MAX_MESSAGE_CHARS,
            PlatformId::Telegram,
        );
        if let Some(channel) = self.channel() {
            if parse_recipient(channel).is_err() {
                result.push_error(format!("invalid Telegram channel id {channel:?}"));
            }
        }
        result
    }

    async fn post(&self, content: &PostContent) -> Result<PostReceipt, ChannelError> {
        Ok(self.post_to_channel(content).await?)
    }
}
