//! Text-completion collaborator.
//!
//! General (non property) chat messages are forwarded to a Gemini-style
//! `generateContent` endpoint. Every failure is reported as a
//! [`CompletionError`]; the resolver turns all of them into its fallback reply.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-pro";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("completion service is not configured")]
    NotConfigured,

    #[error("completion request timed out after {0:?}")]
    Timeout(Duration),

    #[error("completion request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("completion service returned HTTP {0}")]
    Status(u16),

    #[error("malformed completion payload: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, message: &str) -> Result<String, CompletionError>;
}

/// Settings for the completion collaborator.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl CompletionConfig {
    /// A Gemini client when an API key is set, otherwise a service that always fails.
    pub fn build(&self, http: reqwest::Client) -> Arc<dyn CompletionService> {
        match self.api_key.as_deref().filter(|k| !k.is_empty()) {
            Some(key) => Arc::new(GeminiClient::new(http, key, &self.base_url, &self.model)),
            None => Arc::new(Unconfigured),
        }
    }
}

/// Stand-in used when no API key is configured.
pub struct Unconfigured;

#[async_trait]
impl CompletionService for Unconfigured {
    async fn complete(&self, _message: &str) -> Result<String, CompletionError> {
        Err(CompletionError::NotConfigured)
    }
}

// -- Wire types --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<RequestContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<TextPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TextPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<TextPart>,
}

/// Does NOT derive Debug so the API key cannot end up in logs.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(http: reqwest::Client, api_key: &str, base_url: &str, model: &str) -> Self {
        Self {
            http,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    fn request_body(message: &str) -> GenerateRequest {
        GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![TextPart {
                    text: format!(
                        "You are a helpful real estate assistant. Please respond to this user message: {message}"
                    ),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.7,
                top_k: 40,
                top_p: 0.95,
                max_output_tokens: 1024,
            },
        }
    }
}

#[async_trait]
impl CompletionService for GeminiClient {
    async fn complete(&self, message: &str) -> Result<String, CompletionError> {
        let endpoint = format!("{}/models/{}:generateContent", self.base_url, self.model);
        debug!(endpoint = %endpoint, prompt_len = message.len(), "Calling completion service");

        let response = self
            .http
            .post(&endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&Self::request_body(message))
            .send()
            .await
            // The URL carries the API key
            .map_err(|e| CompletionError::Transport(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CompletionError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| CompletionError::Transport(e.without_url()))?;
        let parsed: GenerateResponse =
            serde_json::from_str(&body).map_err(|e| CompletionError::Malformed(e.to_string()))?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| CompletionError::Malformed("no candidates".into()))?;

        let text = text.trim();
        if text.is_empty() {
            return Err(CompletionError::Malformed("empty text".into()));
        }

        Ok(text.to_string())
    }
}
