//! Social network posting adapters: Twitter (X) API v2 and the Facebook
//! Graph API page feed. Both implement [`herald_channels::Platform`].

pub mod error;
pub mod facebook;
pub mod twitter;

pub use error::SocialError;
pub use facebook::FacebookPlatform;
pub use twitter::TwitterPlatform;
