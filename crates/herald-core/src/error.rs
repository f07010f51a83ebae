use thiserror::Error;

#[derive(Debug, Error)]
pub enum HeraldError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),

    #[error("Unknown subscriber role: {0}")]
    UnknownRole(String),
}

pub type Result<T> = std::result::Result<T, HeraldError>;
