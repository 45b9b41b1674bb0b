//! Error types shared by the HTTP pipeline and the table client.
//!
//! # Taxonomy
//! - Transport family: `Transport`, `Status`, `Conflict`
//! - `Deserialize`: response body could not be decoded
//! - `Argument`: rejected before any request was sent
//! - `Auth`: token provider failed
//! - `Config`: client configuration is unusable

use thiserror::Error;

use crate::config::loader::ConfigError;

/// Errors raised by the todo service client.
#[derive(Debug, Error)]
pub enum Error {
    /// Network-level failure (connect, TLS, timeout, broken body stream).
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("HTTP {status} {reason}: {body}")]
    Status {
        status: u16,
        reason: String,
        body: String,
    },

    /// Precondition failed or conflicting write; carries the server's copy when it sent one.
    #[error("HTTP {status}: the item was modified on the server")]
    Conflict {
        status: u16,
        server_item: Option<serde_json::Value>,
    },

    /// Malformed response body.
    #[error("deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),

    /// Missing or invalid argument.
    #[error("invalid argument: {0}")]
    Argument(String),

    /// Token provider failed to produce a token.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Configuration rejected.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl Error {
    /// True for failures that happened on the wire (including HTTP status failures).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Transport(_) | Error::Status { .. } | Error::Conflict { .. }
        )
    }

    /// Status code of an HTTP-level failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Status { status, .. } | Error::Conflict { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Transport(e.to_string())
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TodoItem;

    #[test]
    fn test_error_display() {
        let err = Error::Status {
            status: 500,
            reason: "Internal Server Error".into(),
            body: "boom".into(),
        };
        assert_eq!(err.to_string(), "HTTP 500 Internal Server Error: boom");
        assert!(err.is_transport());
        assert_eq!(err.status(), Some(500));

        let err = Error::Argument("item".into());
        assert_eq!(err.to_string(), "invalid argument: item");
        assert!(!err.is_transport());
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_deserialize_conversion() {
        let json_err = serde_json::from_str::<Vec<TodoItem>>("{not json").unwrap_err();
        let err = Error::from(json_err);
        assert!(matches!(err, Error::Deserialize(_)));
        assert!(!err.is_transport());
    }
}
