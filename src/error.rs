//! Client Error Types
//!
//! Errors surfaced to callers. Rate limiting, "not found" and "conflict" are
//! not errors; they come back as outcomes.

use crate::validation::ValidationError;

/// Error types for client operations
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Input rejected before any network activity
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The service refused the request and said why
    #[error("Request rejected by rustmaps: {reason}")]
    Rejected { reason: String },

    /// Status code the operation has no meaning for
    #[error("Unexpected HTTP status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// Request did not complete within the configured timeout
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Connection or protocol failure below HTTP status level
    #[error("Network error: {0}")]
    Network(String),

    /// A body that should have been JSON was not
    #[error("Failed to decode response body: {0}")]
    Decode(String),

    /// Configuration could not be turned into a working transport
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ClientError {
    /// Status code carried by the error, if it came from an HTTP response
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::UnexpectedStatus { status, .. } => Some(*status),
            ClientError::Rejected { .. } => Some(400),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ClientError::Rejected {
            reason: "seed taken".to_string(),
        };
        assert_eq!(err.to_string(), "Request rejected by rustmaps: seed taken");

        let err = ClientError::UnexpectedStatus {
            status: 503,
            body: "down".to_string(),
        };
        assert!(err.to_string().contains("503"));
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn test_validation_is_transparent() {
        let err: ClientError = ValidationError::InvalidMapId("nope".to_string()).into();
        assert_eq!(err.to_string(), "nope is not a valid UUID");
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_from_serde_error() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: ClientError = parse.into();
        assert!(matches!(err, ClientError::Decode(_)));
    }
}
