//! HTTP seam between the LLM client and the network.
//!
//! `LlmClient` never touches `reqwest` directly; it hands a fully-built request to a
//! `Transport`. Production uses `ReqwestTransport`, tests inject a recording fake.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

/// A failed HTTP exchange. `status` is `None` when no response was received at all.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TransportError {
    pub status: Option<u16>,
    pub message: String,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// POSTs `body` as JSON and returns the decoded JSON response body.
    async fn post_json(
        &self,
        url: &str,
        headers: &[(&'static str, String)],
        body: &Value,
    ) -> Result<Value, TransportError>;
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    error: GoogleErrorBody,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post_json(
        &self,
        url: &str,
        headers: &[(&'static str, String)],
        body: &Value,
    ) -> Result<Value, TransportError> {
        let mut request = self.client.post(url).json(body);
        for (name, value) in headers {
            request = request.header(*name, value);
        }

        let response = request.send().await.map_err(|e| TransportError {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("LLM API returned {}: {}", status, body);
            // Try to parse error message
            let message = serde_json::from_str::<GoogleError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(TransportError {
                status: Some(status.as_u16()),
                message,
            });
        }

        response.json::<Value>().await.map_err(|e| TransportError {
            status: Some(status.as_u16()),
            message: format!("response body was not JSON: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_google_error_body_parses_message() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT"}}"#;
        let parsed: GoogleError = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.error.message, "API key not valid.");
    }

    #[test]
    fn test_transport_error_displays_message() {
        let err = TransportError {
            status: Some(503),
            message: "model overloaded".to_string(),
        };
        assert_eq!(err.to_string(), "model overloaded");
    }
}
