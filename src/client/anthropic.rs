//! Anthropic Messages API client.
//!
//! Epistemic foundation:
//! - K_i: One prompt in, one completion out
//! - B_i: API will respond within timeout (might fail)
//! - B_i: Response will be valid JSON with a text block (might fail)
//! - I^B: Network availability unknowable → surfaced, never retried here

use crate::client::Oracle;
use crate::models::{AnthropicConfig, OracleError};
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

/// Token ceiling for a selection reply. The answer is a three-key JSON object.
pub const MAX_TOKENS: u32 = 300;

/// Sampling temperature. Zero asks for deterministic output (not guaranteed).
pub const TEMPERATURE: f64 = 0.0;

/// Message in a messages request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Messages request payload.
#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<Message>,
}

/// Messages response.
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    model: Option<String>,
    usage: Option<MessagesUsage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessagesUsage {
    input_tokens: u32,
    output_tokens: u32,
}

/// Anthropic API error response.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct ApiErrorDetail {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

/// Anthropic API client.
///
/// Single attempt per call: failures propagate as [`OracleError`] carrying
/// the provider's message.
pub struct AnthropicClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    anthropic_version: String,
    timeout: Duration,
}

impl AnthropicClient {
    /// Create a new client from the resolved API key and config.
    pub fn new(api_key: String, config: &AnthropicConfig) -> Result<Self, OracleError> {
        let timeout = Duration::from_secs(config.timeout_secs);

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OracleError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            anthropic_version: config.anthropic_version.clone(),
            timeout,
        })
    }

    /// Model requested on every call.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Classify a transport failure. Applies to sending and to reading the body.
    fn transport_error(&self, e: reqwest::Error) -> OracleError {
        if e.is_timeout() {
            OracleError::Timeout(self.timeout)
        } else {
            OracleError::Network(e)
        }
    }

    /// Build headers for a request.
    fn headers(&self) -> Result<HeaderMap, OracleError> {
        let mut headers = HeaderMap::new();
        let api_key = HeaderValue::from_str(&self.api_key).map_err(|_| {
            OracleError::AuthenticationFailed("API key contains invalid characters".to_string())
        })?;
        let version = HeaderValue::from_str(&self.anthropic_version)
            .map_err(|e| OracleError::ClientBuild(format!("invalid anthropic-version: {e}")))?;
        headers.insert("x-api-key", api_key);
        headers.insert("anthropic-version", version);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Send one user prompt and return the completion text.
    ///
    /// B_i(API available) → Result
    /// B_i(valid response) → Result
    pub async fn complete_prompt(&self, prompt: &str) -> Result<String, OracleError> {
        let start = Instant::now();
        let request = MessagesRequest {
            model: self.model(),
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            messages: vec![Message::user(prompt)],
        };

        let url = format!("{}/messages", self.base_url);
        let response = self
            .client
            .post(&url)
            .headers(self.headers()?)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;

        let content = parse_messages_response(status, &body, self.model())?;

        debug!(
            model = %self.model(),
            status = status.as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Completion received"
        );

        Ok(content)
    }
}

impl Oracle for AnthropicClient {
    async fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        self.complete_prompt(prompt).await
    }
}

/// Map an HTTP status and body to completion text or a categorized error.
fn parse_messages_response(
    status: StatusCode,
    body: &str,
    model: &str,
) -> Result<String, OracleError> {
    if !status.is_success() {
        let message = serde_json::from_str::<ApiErrorResponse>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.to_string());

        return Err(match status.as_u16() {
            401 => OracleError::AuthenticationFailed(message),
            403 => OracleError::PermissionDenied(message),
            404 => OracleError::ModelNotFound(format!("{model}: {message}")),
            429 => OracleError::RateLimited(message),
            529 => OracleError::Overloaded(message),
            status => OracleError::ApiError { status, message },
        });
    }

    let parsed: MessagesResponse = serde_json::from_str(body)
        .map_err(|e| OracleError::InvalidResponse(format!("Failed to parse response: {e}")))?;

    if let Some(usage) = &parsed.usage {
        debug!(
            model = parsed.model.as_deref().unwrap_or(model),
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            "Token usage"
        );
    }

    let text: String = parsed
        .content
        .iter()
        .filter(|block| block.block_type == "text")
        .filter_map(|block| block.text.as_deref())
        .collect();

    if text.trim().is_empty() {
        return Err(OracleError::InvalidResponse(
            "No text content in response".to_string(),
        ));
    }

    Ok(text.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = "claude-3-5-haiku-20241022";

    #[test]
    fn test_parse_success_joins_text_blocks() {
        let body = r#"{
            "id": "msg_01",
            "type": "message",
            "role": "assistant",
            "model": "claude-3-5-haiku-20241022",
            "content": [
                {"type": "text", "text": "  {\"index\": 1,"},
                {"type": "text", "text": " \"confidence\": \"high\"}\n"}
            ],
            "usage": {"input_tokens": 412, "output_tokens": 31}
        }"#;
        let text = parse_messages_response(StatusCode::OK, body, MODEL).unwrap();
        assert_eq!(text, r#"{"index": 1, "confidence": "high"}"#);
    }

    #[test]
    fn test_parse_success_without_text_is_invalid() {
        let body = r#"{"content": [], "model": "claude-3-5-haiku-20241022"}"#;
        let err = parse_messages_response(StatusCode::OK, body, MODEL).unwrap_err();
        assert!(matches!(err, OracleError::InvalidResponse(_)));
    }

    #[test]
    fn test_parse_garbage_body_is_invalid() {
        let err = parse_messages_response(StatusCode::OK, "<html>", MODEL).unwrap_err();
        assert_eq!(err.category(), "InvalidResponseError");
    }

    #[test]
    fn test_status_mapping() {
        let body = r#"{"type": "error", "error": {"type": "authentication_error", "message": "invalid x-api-key"}}"#;

        let err = parse_messages_response(StatusCode::UNAUTHORIZED, body, MODEL).unwrap_err();
        assert!(matches!(err, OracleError::AuthenticationFailed(ref m) if m == "invalid x-api-key"));

        let err = parse_messages_response(StatusCode::TOO_MANY_REQUESTS, body, MODEL).unwrap_err();
        assert_eq!(err.category(), "RateLimitError");

        let err = parse_messages_response(StatusCode::NOT_FOUND, body, MODEL).unwrap_err();
        assert!(err.to_string().contains(MODEL));

        let overloaded = StatusCode::from_u16(529).unwrap();
        let err = parse_messages_response(overloaded, body, MODEL).unwrap_err();
        assert_eq!(err.category(), "OverloadedError");
    }

    #[test]
    fn test_unstructured_error_body_is_kept() {
        let err = parse_messages_response(StatusCode::BAD_GATEWAY, "upstream down", MODEL)
            .unwrap_err();
        match err {
            OracleError::ApiError { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "upstream down");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_client_trims_base_url() {
        let config = AnthropicConfig {
            base_url: "http://localhost:8080/v1/".to_string(),
            ..Default::default()
        };
        let client = AnthropicClient::new("sk-test".to_string(), &config).unwrap();
        assert_eq!(client.base_url, "http://localhost:8080/v1");
        assert_eq!(client.model(), MODEL);
    }

    /// Serve one response that sends headers and then stalls mid-body.
    fn stalled_body_server() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            use std::io::{Read, Write};
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 8192];
                let _ = stream.read(&mut buf);
                let _ = stream.write_all(
                    b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 512\r\n\r\n{\"content\":",
                );
                let _ = stream.flush();
                std::thread::sleep(Duration::from_secs(5));
            }
        });
        format!("http://{addr}/v1")
    }

    #[tokio::test]
    async fn test_body_read_timeout_is_timeout() {
        let config = AnthropicConfig {
            base_url: stalled_body_server(),
            timeout_secs: 1,
            ..Default::default()
        };
        let client = AnthropicClient::new("sk-test".to_string(), &config).unwrap();

        let err = client.complete_prompt("pick one").await.unwrap_err();
        assert!(matches!(err, OracleError::Timeout(d) if d == Duration::from_secs(1)), "{err:?}");
        assert_eq!(err.category(), "APITimeoutError");
    }

    #[tokio::test]
    async fn test_refused_connection_is_network_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let config = AnthropicConfig {
            base_url: format!("http://127.0.0.1:{port}/v1"),
            timeout_secs: 5,
            ..Default::default()
        };
        let client = AnthropicClient::new("sk-test".to_string(), &config).unwrap();

        let err = client.complete_prompt("pick one").await.unwrap_err();
        assert!(matches!(err, OracleError::Network(_)), "{err:?}");
        assert_eq!(err.category(), "APIConnectionError");
    }

    #[test]
    fn test_request_payload_shape() {
        let request = MessagesRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            messages: vec![Message::user("pick one")],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["max_tokens"], 300);
        assert_eq!(value["temperature"], 0.0);
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "pick one");
    }
}
