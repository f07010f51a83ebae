use async_trait::async_trait;
use herald_channels::{platform::check_length, ChannelError, Platform, PostReceipt};
use herald_core::config::FacebookConfig;
use herald_core::types::{PlatformId, PostContent, ValidationResult};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{retry_after_secs, truncate, SocialError};

pub const MAX_FACEBOOK_CHARS: usize = 63_206;

/// Graph API error codes that mean "slow down" rather than "broken".
const THROTTLE_CODES: [i64; 4] = [4, 17, 32, 613];
/// Expired or revoked access token.
const OAUTH_EXCEPTION: i64 = 190;

/// Publishes to a page feed through `POST {graph_base}/{version}/{page_id}/feed`.
pub struct FacebookPlatform {
    client: reqwest::Client,
    config: Option<FacebookConfig>,
}

#[derive(Deserialize)]
struct FeedResponse {
    id: Option<String>,
}

#[derive(Deserialize)]
struct GraphErrorBody {
    error: GraphError,
}

#[derive(Deserialize)]
struct GraphError {
    message: String,
    #[serde(default)]
    code: i64,
}

impl FacebookPlatform {
    pub fn new(config: Option<FacebookConfig>) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// The link is sent separately so Facebook renders a preview card.
    pub fn message_text(content: &PostContent) -> String {
        content.compose(false)
    }

    async fn publish(&self, config: &FacebookConfig, content: &PostContent) -> Result<PostReceipt, SocialError> {
        let url = format!(
            "{}/{}/{}/feed",
            config.graph_base.trim_end_matches('/'),
            config.api_version,
            config.page_id
        );
        let mut body = serde_json::json!({
            "message": Self::message_text(content),
            "access_token": config.access_token,
        });
        if let Some(link) = content.link.as_deref().filter(|l| !l.is_empty()) {
            body["link"] = serde_json::Value::String(link.to_string());
        }
        debug!(page_id = %config.page_id, "publishing to Facebook page feed");

        let resp = self.client.post(&url).json(&body).send().await?;
        let status = resp.status().as_u16();
        let retry_after = retry_after_secs(resp.headers());

        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(status, body = %truncate(&text, 300), "Facebook Graph API error");
            return Err(graph_error(status, &text, retry_after));
        }

        let parsed: FeedResponse = resp.json().await?;
        let id = parsed.id.ok_or_else(|| SocialError::Parse {
            platform: PlatformId::Facebook,
            message: "missing id".into(),
        })?;
        Ok(PostReceipt {
            url: Some(format!("https://www.facebook.com/{id}")),
            post_id: Some(id),
        })
    }
}

/// Classify a failed Graph API response by its `error.code`, falling back to
/// the HTTP status when the body is not a Graph error.
fn graph_error(status: u16, body: &str, retry_after: Option<u64>) -> SocialError {
    let parsed = serde_json::from_str::<GraphErrorBody>(body).ok().map(|b| b.error);
    let code = parsed.as_ref().map(|e| e.code).unwrap_or_default();
    let message = parsed
        .map(|e| e.message)
        .unwrap_or_else(|| truncate(body, 300));

    if status == 429 || THROTTLE_CODES.contains(&code) {
        SocialError::RateLimited {
            platform: PlatformId::Facebook,
            retry_after_secs: retry_after,
        }
    } else if status == 401 || code == OAUTH_EXCEPTION {
        SocialError::Auth {
            platform: PlatformId::Facebook,
            message,
        }
    } else {
        SocialError::Api {
            platform: PlatformId::Facebook,
            status,
            message,
        }
    }
}

#[async_trait]
impl Platform for FacebookPlatform {
    fn id(&self) -> PlatformId {
        PlatformId::Facebook
    }

    fn is_configured(&self) -> bool {
        self.config
            .as_ref()
            .is_some_and(|c| !c.page_id.trim().is_empty() && !c.access_token.trim().is_empty())
    }

    fn validate_content(&self, content: &PostContent) -> ValidationResult {
        let mut result = ValidationResult::ok();
        check_length(
            &mut result,
            &Self::message_text(content),
            MAX_FACEBOOK_CHARS,
            PlatformId::Facebook,
        );
        if content.link.is_none() {
            result.push_warning("posts without a link get no preview card");
        }
        result
    }

    async fn post(&self, content: &PostContent) -> Result<PostReceipt, ChannelError> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| ChannelError::NotConfigured(PlatformId::Facebook.to_string()))?;
        Ok(self.publish(config, content).await?)
    }
}
