pub mod error;
pub mod manager;
pub mod platform;
pub mod types;

pub use error::ChannelError;
pub use manager::PlatformSet;
pub use platform::Platform;
pub use types::{PlatformStatus, PostReceipt};
