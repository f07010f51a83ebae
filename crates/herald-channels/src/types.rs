use herald_core::types::PlatformId;
use serde::{Deserialize, Serialize};

/// What a platform returns for a published post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostReceipt {
    /// Platform-native identifier (tweet id, page post id, message id).
    pub post_id: Option<String>,
    /// Public permalink, when the platform exposes one.
    pub url: Option<String>,
}

/// Configuration state of one registered adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformStatus {
    pub platform: PlatformId,
    pub configured: bool,
}
