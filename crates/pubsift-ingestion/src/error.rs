use thiserror::Error;

/// Search-phase failures. Each kind gets its own user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// Transport failure: connection refused, DNS, timeout, blocked host.
    #[error("could not connect to PubMed: {0}")]
    Connection(String),

    /// Non-200 status after the retry budget was spent.
    #[error("PubMed returned HTTP {0}")]
    Status(u16),

    /// Body was not JSON or lacked the expected structure.
    #[error("invalid response from PubMed: {0}")]
    Malformed(String),

    /// PubMed reported an error of its own.
    #[error("PubMed error: {0}")]
    Provider(String),
}

impl SearchError {
    pub fn user_message(&self) -> String {
        match self {
            SearchError::Connection(_) | SearchError::Status(_) => {
                "❌ Error: Could not connect to PubMed. Please check your internet connection and try again."
                    .to_string()
            }
            SearchError::Malformed(_) => {
                "❌ Error: Invalid response from PubMed. Please try again.".to_string()
            }
            SearchError::Provider(message) => format!("❌ PubMed error: {message}"),
        }
    }
}
