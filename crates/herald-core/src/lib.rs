//! `herald-core`: configuration, error and domain types shared by every
//! Herald crate.

pub mod config;
pub mod error;
pub mod types;

pub use config::HeraldConfig;
pub use error::{HeraldError, Result};
pub use types::{PlatformId, PlatformResult, PostContent, Role, ValidationResult};
