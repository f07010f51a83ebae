use async_trait::async_trait;
use herald_channels::{platform::check_length, ChannelError, Platform, PostReceipt};
use herald_core::config::TwitterConfig;
use herald_core::types::{PlatformId, PostContent, ValidationResult};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{retry_after_secs, truncate, SocialError};

pub const MAX_TWEET_CHARS: usize = 280;

/// Posts to `POST {api_base}/2/tweets` with an OAuth 2.0 user token.
pub struct TwitterPlatform {
    client: reqwest::Client,
    config: Option<TwitterConfig>,
}

#[derive(Deserialize)]
struct CreateTweetResponse {
    data: Option<TweetData>,
}

#[derive(Deserialize)]
struct TweetData {
    id: String,
}

impl TwitterPlatform {
    pub fn new(config: Option<TwitterConfig>) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Tweet text: body, hashtags and link. Links count toward the limit as
    /// typed; t.co shortening is not modelled.
    pub fn tweet_text(content: &PostContent) -> String {
        content.compose(true)
    }

    async fn create_tweet(&self, config: &TwitterConfig, text: &str) -> Result<PostReceipt, SocialError> {
        let url = format!("{}/2/tweets", config.api_base.trim_end_matches('/'));
        debug!(chars = text.chars().count(), "sending tweet");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&config.bearer_token)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status == 429 {
            return Err(SocialError::RateLimited {
                platform: PlatformId::Twitter,
                retry_after_secs: retry_after_secs(resp.headers()),
            });
        }
        if !resp.status().is_success() {
            let body = truncate(&resp.text().await.unwrap_or_default(), 300);
            warn!(status, body = %body, "Twitter API error");
            return Err(if status == 401 || status == 403 {
                SocialError::Auth {
                    platform: PlatformId::Twitter,
                    message: body,
                }
            } else {
                SocialError::Api {
                    platform: PlatformId::Twitter,
                    status,
                    message: body,
                }
            });
        }

        let parsed: CreateTweetResponse = resp.json().await?;
        let id = parsed.data.map(|d| d.id).ok_or_else(|| SocialError::Parse {
            platform: PlatformId::Twitter,
            message: "missing data.id".into(),
        })?;
        Ok(PostReceipt {
            url: Some(format!("https://twitter.com/i/web/status/{id}")),
            post_id: Some(id),
        })
    }
}

#[async_trait]
impl Platform for TwitterPlatform {
    fn id(&self) -> PlatformId {
        PlatformId::Twitter
    }

    fn is_configured(&self) -> bool {
        self.config
            .as_ref()
            .is_some_and(|c| !c.bearer_token.trim().is_empty())
    }

    fn validate_content(&self, content: &PostContent) -> ValidationResult {
        let mut result = ValidationResult::ok();
        check_length(&mut result, &Self::tweet_text(content), MAX_TWEET_CHARS, PlatformId::Twitter);
        if content.hashtags.len() > 3 {
            result.push_warning("more than 3 hashtags tends to reduce engagement");
        }
        result
    }

    async fn post(&self, content: &PostContent) -> Result<PostReceipt, ChannelError> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| ChannelError::NotConfigured(PlatformId::Twitter.to_string()))?;
        Ok(self.create_tweet(config, &Self::tweet_text(content)).await?)
    }
}
