//! Anthropic Messages API client.
//!
//! Sends a single user prompt to `POST /v1/messages` and returns the text of
//! the first content block. There is no retry: a failed call is returned to
//! the caller, which decides whether to degrade.

use super::AskModel;
use crate::error::SummarizeError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{instrument, warn};

pub const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
pub const API_VERSION: &str = "2023-06-01";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

/// Client for the Anthropic Messages API.
pub struct ClaudeClient {
    http: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl fmt::Debug for ClaudeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClaudeClient")
            .field("model", &self.model)
            .finish()
    }
}

impl ClaudeClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, SummarizeError> {
        let http = Client::builder()
            .user_agent(concat!("ai_news_daily/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            model: model.into(),
            endpoint: MESSAGES_URL.to_string(),
        })
    }

    /// Point the client at a local endpoint, bypassing any system proxy.
    #[cfg(test)]
    fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.http = Client::builder()
            .no_proxy()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap();
        self.endpoint = endpoint.into();
        self
    }
}

impl AskModel for ClaudeClient {
    #[instrument(level = "info", skip_all, fields(model = %self.model, max_tokens = max_tokens))]
    async fn ask(&self, prompt: &str, max_tokens: u32) -> Result<String, SummarizeError> {
        let t0 = Instant::now();
        let request = MessagesRequest {
            model: &self.model,
            max_tokens,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .http
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .inspect_err(|e| {
                warn!(elapsed_ms = t0.elapsed().as_millis() as u64, error = %e, "API call failed")
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .inspect_err(|e| warn!(%status, error = %e, "Failed to read API response"))?;
        let dt = t0.elapsed();

        if !status.is_success() {
            let err = parse_error(status.as_u16(), &body);
            warn!(elapsed_ms = dt.as_millis() as u64, %status, error = %err, "API call failed");
            return Err(err);
        }
        extract_text(&body)
    }
}

/// Turn an error response body into [`SummarizeError::Api`].
fn parse_error(status: u16, body: &str) -> SummarizeError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => SummarizeError::Api {
            kind: envelope.error.kind,
            message: envelope.error.message,
        },
        Err(_) => SummarizeError::Api {
            kind: format!("http_{status}"),
            message: crate::utils::truncate_for_log(body, 200),
        },
    }
}

/// Pull the first text block out of a successful response body.
fn extract_text(body: &str) -> Result<String, SummarizeError> {
    let parsed: MessagesResponse = serde_json::from_str(body).map_err(|e| SummarizeError::Api {
        kind: "malformed_response".to_string(),
        message: e.to_string(),
    })?;
    parsed
        .content
        .into_iter()
        .find(|block| block.kind == "text")
        .and_then(|block| block.text)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or(SummarizeError::EmptyResponse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let request = MessagesRequest {
            model: DEFAULT_MODEL,
            max_tokens: 300,
            messages: vec![Message {
                role: "user",
                content: "hello",
            }],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], DEFAULT_MODEL);
        assert_eq!(value["max_tokens"], 300);
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "hello");
    }

    #[test]
    fn test_extract_text() {
        let body = r#"{
            "id": "msg_01",
            "type": "message",
            "role": "assistant",
            "content": [{"type": "text", "text": "  要約です。 \n"}],
            "stop_reason": "end_turn"
        }"#;
        assert_eq!(extract_text(body).unwrap(), "要約です。");
    }

    #[test]
    fn test_extract_text_without_text_block() {
        let body = r#"{"content": []}"#;
        assert!(matches!(extract_text(body), Err(SummarizeError::EmptyResponse)));
    }

    #[test]
    fn test_extract_text_malformed() {
        assert!(matches!(
            extract_text("not json"),
            Err(SummarizeError::Api { .. })
        ));
    }

    #[test]
    fn test_parse_error_envelope() {
        let body = r#"{"type": "error", "error": {"type": "overloaded_error", "message": "Overloaded"}}"#;
        match parse_error(529, body) {
            SummarizeError::Api { kind, message } => {
                assert_eq!(kind, "overloaded_error");
                assert_eq!(message, "Overloaded");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_parse_error_plain_body() {
        match parse_error(502, "Bad Gateway") {
            SummarizeError::Api { kind, message } => {
                assert_eq!(kind, "http_502");
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_transport_failure_is_returned() {
        // Bind then drop to get a local port with nothing listening.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let client = ClaudeClient::new("key", DEFAULT_MODEL)
            .unwrap()
            .with_endpoint(format!("http://127.0.0.1:{port}/v1/messages"));

        let err = client.ask("hello", 10).await.unwrap_err();
        assert!(matches!(err, SummarizeError::Http(_)));
    }

    #[test]
    fn test_debug_hides_key() {
        let client = ClaudeClient::new("secret-key", DEFAULT_MODEL).unwrap();
        let printed = format!("{client:?}");
        assert!(!printed.contains("secret-key"));
        assert!(printed.contains(DEFAULT_MODEL));
    }
}
