//! Error types for the chat client.
//!
//! None of these escape the public lifecycle operations (`submit`, store
//! hydration, session resolution). They are surfaced as error-flagged chat
//! messages or logged and degraded.

use thiserror::Error;

/// Result type for chat client operations
pub type ChatResult<T> = Result<T, ChatError>;

/// Chat client errors
#[derive(Error, Debug)]
pub enum ChatError {
    /// Network failure or non-success HTTP status
    #[error("{0}")]
    Transport(String),

    /// Response body present but not in the expected shape
    #[error("{0}")]
    Payload(String),

    /// Storage medium absent, full, or holding corrupt data
    #[error("Storage error: {0}")]
    Persistence(String),

    /// Attachment reference could not be made absolute
    #[error("Cannot resolve '{reference}': {reason}")]
    Resolution { reference: String, reason: String },

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_displays_detail_only() {
        let err = ChatError::Transport("rate limited".to_string());
        assert_eq!(err.to_string(), "rate limited");
    }

    #[test]
    fn test_persistence_error_names_storage() {
        let err = ChatError::Persistence("quota exceeded".to_string());
        assert_eq!(err.to_string(), "Storage error: quota exceeded");
    }

    #[test]
    fn test_json_error_converts() {
        let err: ChatError = serde_json::from_str::<Vec<u8>>("{").unwrap_err().into();
        assert!(matches!(err, ChatError::Json(_)));
    }
}
