/// LLM Client. The single point of entry for all model calls.
///
/// No other module talks to a model backend directly. Every generation stage hands a
/// `StagePrompt` to a `CompletionProvider`; in production that is `LlmClient`, which
/// decides per call whether Vertex AI or AI Studio serves the request.
///
/// The client returns raw text that is *supposed* to be JSON. Parsing and shape checks
/// belong to `generation::validator`.
use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use crate::config::ProviderConfig;
use crate::generation::contract::Stage;

pub mod extract;
pub mod prompts;
pub mod transport;

use extract::{extract_text, STUDIO_EXTRACTORS, VERTEX_EXTRACTORS};
use transport::{Transport, TransportError};

/// Used when the configured model name is empty.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

const STUDIO_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Error)]
pub enum ProviderError {
    /// A deployment setting is missing. Never retryable.
    #[error("Provider configuration error: {0}")]
    Configuration(String),

    /// The selected backend has no usable credential, or rejected it.
    #[error("Provider authentication error: {0}")]
    Authentication(String),

    /// Anything else the backend reported, passed through as received.
    #[error("Upstream error (status {status:?}): {message}")]
    Upstream {
        status: Option<u16>,
        message: String,
    },
}

impl From<TransportError> for ProviderError {
    fn from(e: TransportError) -> Self {
        ProviderError::Upstream {
            status: e.status,
            message: e.message,
        }
    }
}

/// A fully rendered prompt for one pipeline stage.
#[derive(Debug, Clone)]
pub struct StagePrompt {
    pub stage: Stage,
    pub system: String,
    pub user: String,
}

/// Anything that can answer a stage prompt with (supposedly) JSON text.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete_json(&self, prompt: &StagePrompt) -> Result<String, ProviderError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Vertex AI: project-scoped, OAuth bearer token.
    Vertex,
    /// AI Studio: API key.
    Studio,
}

/// Routes model calls to Vertex AI or AI Studio.
///
/// Holds no per-call state; the configuration is fixed at construction.
#[derive(Clone)]
pub struct LlmClient {
    config: Arc<ProviderConfig>,
    next_gen: Regex,
    transport: Arc<dyn Transport>,
}

impl LlmClient {
    pub fn new(config: ProviderConfig, transport: Arc<dyn Transport>) -> Result<Self, ProviderError> {
        let next_gen = Regex::new(&config.next_gen_pattern).map_err(|e| {
            ProviderError::Configuration(format!(
                "GOOGLE_NEXT_GEN_PATTERN is not a valid regex: {e}"
            ))
        })?;
        Ok(Self {
            config: Arc::new(config),
            next_gen,
            transport,
        })
    }

    /// The model actually used for a requested name.
    pub fn resolve_model<'a>(&self, requested: &'a str) -> &'a str {
        let trimmed = requested.trim();
        if trimmed.is_empty() {
            DEFAULT_MODEL
        } else {
            trimmed
        }
    }

    pub fn select_backend(&self, model: &str) -> Backend {
        if self.config.force_vertex || self.next_gen.is_match(model) {
            Backend::Vertex
        } else {
            Backend::Studio
        }
    }

    /// Runs one completion against whichever backend serves `model`.
    pub async fn complete(
        &self,
        system: &str,
        user: &str,
        model: &str,
    ) -> Result<String, ProviderError> {
        let model = self.resolve_model(model);
        let backend = self.select_backend(model);
        debug!("LLM call routed to {:?} (model: {})", backend, model);

        let body = request_body(system, user);
        match backend {
            Backend::Vertex => self.call_vertex(model, &body).await,
            Backend::Studio => self.call_studio(model, &body).await,
        }
    }

    async fn call_vertex(&self, model: &str, body: &Value) -> Result<String, ProviderError> {
        let project = self
            .config
            .vertex_project
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                ProviderError::Configuration(format!(
                    "GOOGLE_PROJECT_ID is required for Vertex AI (model '{model}')"
                ))
            })?;
        let token = self
            .config
            .vertex_access_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                ProviderError::Authentication(
                    "Vertex AI needs an OAuth access token. Set GOOGLE_VERTEX_ACCESS_TOKEN \
                     (e.g. from `gcloud auth print-access-token`) for a principal with \
                     Vertex AI User permissions."
                        .to_string(),
                )
            })?;

        let location = &self.config.vertex_location;
        let url = format!(
            "https://{location}-aiplatform.googleapis.com/v1/projects/{project}/locations/{location}/publishers/google/models/{model}:generateContent"
        );
        let headers = [("authorization", format!("Bearer {token}"))];

        match self.transport.post_json(&url, &headers, body).await {
            Ok(response) => Ok(extract_text(&response, VERTEX_EXTRACTORS)),
            Err(e) => Err(classify_vertex_failure(e)),
        }
    }

    async fn call_studio(&self, model: &str, body: &Value) -> Result<String, ProviderError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                ProviderError::Authentication(
                    "Missing GOOGLE_API_KEY. Use AI Studio API keys with gemini-1.5-* models, \
                     or configure Vertex AI for next-generation models."
                        .to_string(),
                )
            })?;

        let url = format!("{STUDIO_BASE_URL}/models/{model}:generateContent");
        let headers = [("x-goog-api-key", api_key.to_string())];

        match self.transport.post_json(&url, &headers, body).await {
            Ok(response) => Ok(extract_text(&response, STUDIO_EXTRACTORS)),
            Err(e) => Err(classify_studio_failure(e)),
        }
    }
}

#[async_trait]
impl CompletionProvider for LlmClient {
    async fn complete_json(&self, prompt: &StagePrompt) -> Result<String, ProviderError> {
        debug!("Completing stage {}", prompt.stage);
        self.complete(&prompt.system, &prompt.user, &self.config.model)
            .await
    }
}

fn request_body(system: &str, user: &str) -> Value {
    json!({
        "systemInstruction": { "parts": [{ "text": system }] },
        "contents": [{ "role": "user", "parts": [{ "text": user }] }],
        "generationConfig": { "responseMimeType": "application/json", "temperature": 0 }
    })
}

fn classify_studio_failure(e: TransportError) -> ProviderError {
    let key_related = ["API keys are not supported", "API key not valid", "CREDENTIALS_MISSING"]
        .iter()
        .any(|needle| e.message.contains(needle));
    if e.status == Some(401) || key_related {
        return ProviderError::Authentication(
            "Invalid or missing API key for Google AI Studio.".to_string(),
        );
    }
    e.into()
}

fn classify_vertex_failure(e: TransportError) -> ProviderError {
    let lower = e.message.to_lowercase();
    let auth_related = ["permission", "unauthorized", "unauthenticated"]
        .iter()
        .any(|needle| lower.contains(needle));
    if matches!(e.status, Some(401) | Some(403)) || auth_related {
        return ProviderError::Authentication(
            "Vertex AI rejected the credentials. Check the token's principal has Vertex AI \
             permissions on GOOGLE_PROJECT_ID."
                .to_string(),
        );
    }
    e.into()
}
