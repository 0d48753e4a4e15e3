//! Error types for composing and delivering messages.

use std::path::PathBuf;
use thiserror::Error;

/// Failures detected before anything is sent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The message text was empty or whitespace only.
    #[error("message cannot be empty")]
    EmptyMessage,

    /// A required project field was left blank.
    #[error("required field is missing: {0}")]
    MissingField(&'static str),

    /// Custom source selected with additional information but no source text.
    #[error("please specify the custom information source")]
    MissingCustomSource,

    /// A referenced path does not exist.
    #[error("{label} not found: {}", .path.display())]
    PathNotFound { label: &'static str, path: PathBuf },
}

/// Outcome of a failed delivery attempt.
///
/// Every variant is terminal for the call. Nothing is retried.
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Nothing is listening on the target address.
    #[error("could not connect to {url}: {reason}. Is the editor open with the extension listening on port {port}?")]
    Connection {
        url: String,
        port: u16,
        reason: String,
    },

    /// The listener accepted the request but did not answer in time.
    #[error("request to {url} timed out after {secs:.1}s")]
    Timeout { url: String, secs: f64 },

    /// The listener answered with something other than 200.
    #[error("listener returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The listener answered 200 with a body that is not the expected JSON.
    #[error("malformed response ({reason}): {body}")]
    Malformed { body: String, reason: String },

    /// Any other transport failure.
    #[error("request failed: {0}")]
    Transport(String),
}

impl DeliveryError {
    /// Short label for the failure category.
    pub fn kind(&self) -> &'static str {
        match self {
            DeliveryError::Validation(_) => "validation",
            DeliveryError::Connection { .. } => "connection",
            DeliveryError::Timeout { .. } => "timeout",
            DeliveryError::Status { .. } | DeliveryError::Malformed { .. } => "protocol",
            DeliveryError::Transport(_) => "transport",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_error_mentions_listener() {
        let err = DeliveryError::Connection {
            url: "http://localhost:12345/message".to_string(),
            port: 12345,
            reason: "connection refused".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("extension listening on port 12345"));
        assert_eq!(err.kind(), "connection");
    }

    #[test]
    fn test_protocol_kinds() {
        let status = DeliveryError::Status {
            status: 500,
            body: "boom".to_string(),
        };
        let malformed = DeliveryError::Malformed {
            body: "<html>".to_string(),
            reason: "expected value".to_string(),
        };
        assert_eq!(status.kind(), "protocol");
        assert_eq!(malformed.kind(), "protocol");
        assert!(status.to_string().contains("HTTP 500"));
    }

    #[test]
    fn test_path_not_found_display() {
        let err = ValidationError::PathNotFound {
            label: "technology path",
            path: PathBuf::from("/nope"),
        };
        assert_eq!(err.to_string(), "technology path not found: /nope");
    }
}
