//! Wire types for the listener's `/message` endpoint.
//!
//! The protocol is a single JSON POST per message; nothing is kept between calls.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Request body sent to the listener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRequest {
    /// The instruction text.
    pub text: String,
    /// Absolute path of the attached file, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// Base name of the attached file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl MessageRequest {
    /// Create a request without an attachment.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            file_path: None,
            file_name: None,
        }
    }

    /// Attach a file. `path` should already be absolute.
    pub fn with_attachment(mut self, path: &Path) -> Self {
        self.file_path = Some(path.to_string_lossy().into_owned());
        self.file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        self
    }
}

/// Response body returned by the listener.
///
/// Either `result` or `copilot_reply` is expected, with no rule for which.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub status: String,
    /// Echo of the text that was sent.
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copilot_reply: Option<String>,
    /// Free-form hint for the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

/// Whichever reply field the listener filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply<'a> {
    Copilot(&'a str),
    Result(&'a str),
}

impl MessageResponse {
    /// The reply, preferring `copilot_reply` when the listener sent it.
    pub fn reply(&self) -> Option<Reply<'_>> {
        if let Some(reply) = self.copilot_reply.as_deref() {
            Some(Reply::Copilot(reply))
        } else {
            self.result.as_deref().map(Reply::Result)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_without_attachment() {
        let json = serde_json::to_string(&MessageRequest::new("Hello")).unwrap();
        assert_eq!(json, r#"{"text":"Hello"}"#);
    }

    #[test]
    fn test_request_with_attachment() {
        let req = MessageRequest::new("Hello").with_attachment(Path::new("/tmp/a.py"));
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["file_path"], "/tmp/a.py");
        assert_eq!(value["file_name"], "a.py");
    }

    #[test]
    fn test_response_reply_variants() {
        let resp: MessageResponse = serde_json::from_str(
            r#"{"status":"success","message":"hi","result":"message_sent","instructions":"check chat"}"#,
        )
        .unwrap();
        assert_eq!(resp.reply(), Some(Reply::Result("message_sent")));
        assert_eq!(resp.instructions.as_deref(), Some("check chat"));

        let resp: MessageResponse =
            serde_json::from_str(r#"{"status":"success","message":"hi","copilot_reply":"done","result":"x"}"#)
                .unwrap();
        assert_eq!(resp.reply(), Some(Reply::Copilot("done")));
    }

    #[test]
    fn test_response_tolerates_missing_fields() {
        let resp: MessageResponse = serde_json::from_str(r#"{"extra":1}"#).unwrap();
        assert!(resp.status.is_empty());
        assert!(resp.reply().is_none());
    }
}
