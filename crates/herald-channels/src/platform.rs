use async_trait::async_trait;
use herald_core::types::{PlatformId, PostContent, ValidationResult};

use crate::{error::ChannelError, types::PostReceipt};

/// Common interface implemented by every posting adapter (Twitter, Facebook,
/// Telegram, …).
///
/// Implementations must be `Send + Sync` so they can be stored in a
/// [`PlatformSet`](crate::manager::PlatformSet) and invoked from several
/// Tokio tasks at once.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Which platform this adapter posts to. Used as the key inside
    /// [`PlatformSet`](crate::manager::PlatformSet); must be unique.
    fn id(&self) -> PlatformId;

    /// Whether credentials and target are present. Unconfigured adapters are
    /// never asked to post.
    fn is_configured(&self) -> bool;

    /// Pre-flight checks (length limits, required fields). Must not perform
    /// I/O.
    fn validate_content(&self, content: &PostContent) -> ValidationResult;

    /// Publish `content`. Only called after `is_configured` returned true and
    /// `validate_content` reported no errors.
    async fn post(&self, content: &PostContent) -> Result<PostReceipt, ChannelError>;
}

/// Shared length check used by the adapters' `validate_content`.
pub fn check_length(result: &mut ValidationResult, text: &str, max_chars: usize, platform: PlatformId) {
    let len = text.chars().count();
    if text.trim().is_empty() {
        result.push_error(format!("{platform} post text is empty"));
    } else if len > max_chars {
        result.push_error(format!("{platform} post is {len} characters (max {max_chars})"));
    }
}
