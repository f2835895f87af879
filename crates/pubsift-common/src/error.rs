use thiserror::Error;

/// Errors shared by the pubsift crates outside the search pipeline itself.
#[derive(Debug, Error)]
pub enum PubsiftError {
    #[error("Journal table is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Request to a host outside the allowlist.
    #[error("Security error: {0}")]
    SecurityError(String),
}

pub type Result<T> = std::result::Result<T, PubsiftError>;
