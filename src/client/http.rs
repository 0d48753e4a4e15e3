//! HTTP delivery of composed messages to the listener.

use crate::config::ClientConfig;
use crate::error::{DeliveryError, ValidationError};
use crate::protocol::{MessageRequest, MessageResponse};
use reqwest::{Client, StatusCode};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Sends one message per call to the listener's `/message` endpoint.
#[derive(Debug, Clone)]
pub struct DeliveryClient {
    client: Client,
    config: ClientConfig,
}

impl DeliveryClient {
    /// Create a client for the configured listener.
    pub fn new(config: ClientConfig) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| DeliveryError::Transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Send `text`, attaching the first existing path among `candidates`.
    ///
    /// Exactly one request is made. Every failure comes back as an error value.
    pub async fn send<P: AsRef<Path>>(
        &self,
        text: &str,
        candidates: &[P],
    ) -> Result<MessageResponse, DeliveryError> {
        let request = build_request(text, candidates)?;
        let url = self.config.endpoint();

        info!("Sending message ({} chars) to {}", request.text.len(), url);
        if let Some(path) = &request.file_path {
            info!("Attached file: {}", path);
        }

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.classify(&url, e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.classify(&url, e))?;
        debug!("Listener answered {} with {} bytes", status, body.len());

        if status != StatusCode::OK {
            warn!("Listener returned HTTP {}", status);
            return Err(DeliveryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_response(body)
    }

    /// Map a transport error onto the failure taxonomy.
    fn classify(&self, url: &str, err: reqwest::Error) -> DeliveryError {
        if err.is_timeout() {
            warn!("Request to {} timed out", url);
            DeliveryError::Timeout {
                url: url.to_string(),
                secs: self.config.timeout().as_secs_f64(),
            }
        } else if err.is_connect() {
            warn!("Could not connect to {}", url);
            DeliveryError::Connection {
                url: url.to_string(),
                port: self.config.port,
                reason: root_cause(&err),
            }
        } else {
            DeliveryError::Transport(root_cause(&err))
        }
    }
}

/// Parse a 200 body. Only a JSON object counts as a response.
fn parse_response(body: String) -> Result<MessageResponse, DeliveryError> {
    let malformed = |body: String, reason: String| {
        warn!("Listener response is malformed: {}", reason);
        DeliveryError::Malformed { body, reason }
    };

    let value: serde_json::Value = match serde_json::from_str(&body) {
        Ok(value) => value,
        Err(e) => return Err(malformed(body, e.to_string())),
    };
    if !value.is_object() {
        return Err(malformed(body, "expected a JSON object".to_string()));
    }
    serde_json::from_value(value).map_err(|e| malformed(body, e.to_string()))
}

/// Innermost error message, which for connect failures is the OS reason.
fn root_cause(err: &(dyn std::error::Error + 'static)) -> String {
    let mut current = err;
    while let Some(source) = std::error::Error::source(current) {
        current = source;
    }
    current.to_string()
}

/// Pick the first candidate that exists, as an absolute path.
///
/// Missing candidates are reported and skipped; they never fail the send.
pub fn resolve_attachment<P: AsRef<Path>>(candidates: &[P]) -> Option<PathBuf> {
    for candidate in candidates {
        let candidate = candidate.as_ref();
        if candidate.as_os_str().is_empty() {
            continue;
        }
        if !candidate.exists() {
            warn!("File not found, not attaching: {}", candidate.display());
            continue;
        }
        match std::path::absolute(candidate) {
            Ok(path) => return Some(path),
            Err(e) => warn!("Could not resolve {}: {}", candidate.display(), e),
        }
    }
    None
}

/// Build the request body, rejecting empty text before any network activity.
pub fn build_request<P: AsRef<Path>>(
    text: &str,
    candidates: &[P],
) -> Result<MessageRequest, ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::EmptyMessage);
    }

    let request = MessageRequest::new(text);
    Ok(match resolve_attachment(candidates) {
        Some(path) => request.with_attachment(&path),
        None => request,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    const NO_FILES: &[&str] = &[];

    fn config_for(port: u16, timeout_secs: f64) -> ClientConfig {
        ClientConfig {
            host: "127.0.0.1".to_string(),
            port,
            timeout_secs,
        }
    }

    /// Read one HTTP request (headers plus Content-Length body).
    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).into_owned();
            if let Some(end) = text.find("\r\n\r\n") {
                let len = text[..end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + len {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Stand-in listener that answers a single request.
    async fn spawn_listener(status_line: &'static str, body: &'static str) -> (u16, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.flush().await.unwrap();
            request
        });
        (port, handle)
    }

    #[test]
    fn test_build_request_plain() {
        let req = build_request("Hello", NO_FILES).unwrap();
        assert_eq!(serde_json::to_string(&req).unwrap(), r#"{"text":"Hello"}"#);
    }

    #[test]
    fn test_build_request_rejects_empty() {
        assert_eq!(
            build_request("  \n", NO_FILES),
            Err(ValidationError::EmptyMessage)
        );
    }

    #[test]
    fn test_build_request_attaches_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.py");
        std::fs::write(&file, "print('hi')\n").unwrap();

        let req = build_request("Hello", &[&file]).unwrap();
        let file_path = req.file_path.unwrap();
        assert!(Path::new(&file_path).is_absolute());
        assert!(file_path.ends_with("a.py"));
        assert_eq!(req.file_name.as_deref(), Some("a.py"));
    }

    #[test]
    fn test_resolve_attachment_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.txt");
        let second = dir.path().join("second.txt");
        let missing = dir.path().join("missing.txt");
        std::fs::write(&first, "1").unwrap();
        std::fs::write(&second, "2").unwrap();

        let picked = resolve_attachment(&[missing.clone(), second.clone(), first.clone()]);
        assert_eq!(picked.as_deref(), Some(second.as_path()));

        let picked = resolve_attachment(&[first.clone(), second]);
        assert_eq!(picked.as_deref(), Some(first.as_path()));

        assert!(resolve_attachment(&[missing]).is_none());
        assert!(resolve_attachment(&[PathBuf::new()]).is_none());
    }

    #[tokio::test]
    async fn test_send_success() {
        let (port, handle) = spawn_listener(
            "200 OK",
            r#"{"status":"success","message":"Hello","result":"message_sent"}"#,
        )
        .await;

        let client = DeliveryClient::new(config_for(port, 5.0)).unwrap();
        let response = client.send("Hello", NO_FILES).await.unwrap();
        assert_eq!(response.status, "success");
        assert_eq!(response.message, "Hello");
        assert_eq!(response.result.as_deref(), Some("message_sent"));

        let request = handle.await.unwrap();
        assert!(request.starts_with("POST /message HTTP/1.1"));
        assert!(request.to_ascii_lowercase().contains("content-type: application/json"));
        assert!(request.ends_with(r#"{"text":"Hello"}"#));
    }

    #[tokio::test]
    async fn test_send_server_error() {
        let (port, _handle) =
            spawn_listener("500 Internal Server Error", r#"{"error":"boom"}"#).await;

        let client = DeliveryClient::new(config_for(port, 5.0)).unwrap();
        match client.send("Hello", NO_FILES).await {
            Err(DeliveryError::Status { status, body }) => {
                assert_eq!(status, 500);
                assert!(body.contains("boom"));
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_malformed_body() {
        let (port, _handle) = spawn_listener("200 OK", "not json").await;

        let client = DeliveryClient::new(config_for(port, 5.0)).unwrap();
        let err = client.send("Hello", NO_FILES).await.unwrap_err();
        assert!(matches!(err, DeliveryError::Malformed { ref body, .. } if body == "not json"));
        assert_eq!(err.kind(), "protocol");
    }

    #[tokio::test]
    async fn test_send_array_body() {
        let (port, _handle) = spawn_listener("200 OK", r#"["x","y"]"#).await;

        let client = DeliveryClient::new(config_for(port, 5.0)).unwrap();
        let err = client.send("Hello", NO_FILES).await.unwrap_err();
        match err {
            DeliveryError::Malformed { body, reason } => {
                assert_eq!(body, r#"["x","y"]"#);
                assert_eq!(reason, "expected a JSON object");
            }
            other => panic!("expected malformed response, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_response_rejects_non_objects() {
        for body in ["[]", "\"ok\"", "42", "null"] {
            assert!(
                matches!(parse_response(body.to_string()), Err(DeliveryError::Malformed { .. })),
                "accepted {}",
                body
            );
        }
        let response = parse_response(r#"{"status":"success","message":"hi"}"#.to_string()).unwrap();
        assert_eq!(response.status, "success");
    }

    #[tokio::test]
    async fn test_send_connection_refused() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let client = DeliveryClient::new(config_for(port, 5.0)).unwrap();
        let err = client.send("Hello", NO_FILES).await.unwrap_err();
        assert!(matches!(err, DeliveryError::Connection { .. }), "got {:?}", err);
        assert_eq!(err.kind(), "connection");
    }

    #[tokio::test]
    async fn test_send_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let _handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            read_request(&mut stream).await;
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(stream);
        });

        let client = DeliveryClient::new(config_for(port, 0.2)).unwrap();
        let err = client.send("Hello", NO_FILES).await.unwrap_err();
        assert!(matches!(err, DeliveryError::Timeout { .. }), "got {:?}", err);
        assert_eq!(err.kind(), "timeout");
    }

    #[tokio::test]
    async fn test_send_empty_text_makes_no_request() {
        let client = DeliveryClient::new(config_for(1, 5.0)).unwrap();
        let err = client.send("", NO_FILES).await.unwrap_err();
        assert!(matches!(
            err,
            DeliveryError::Validation(ValidationError::EmptyMessage)
        ));
    }
}
