use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("No provider found for platform: {0}")]
    UnknownPlatform(String),

    #[error("OAuth exchange failed: {0}")]
    OAuth(String),

    #[error("Publish failed: {0}")]
    Publish(String),
}
