pub mod anthropic;
pub mod openai;
pub mod types;

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiCompatProvider;
pub use types::{ChatMessage, CompletionRequest, CompletionResponse, TranscriptionRequest};

/// External completion capability. Must be assumed fallible: timeouts,
/// malformed output, and auth failures all surface as errors here and are
/// classified by the caller.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    async fn health(&self) -> Result<()> {
        Ok(())
    }
}

/// External speech-to-text capability.
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    async fn transcribe(&self, request: TranscriptionRequest) -> Result<String>;
}

/// Error classification shared by all HTTP providers.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderErrorKind {
    RateLimit,
    ServerError,
    Timeout,
    AuthError,
    InvalidRequest,
    Unknown,
}

impl ProviderErrorKind {
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        match status.as_u16() {
            429 => Self::RateLimit,
            401 | 403 => Self::AuthError,
            400 | 422 => Self::InvalidRequest,
            500..=599 => Self::ServerError,
            _ => Self::Unknown,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimit | Self::ServerError | Self::Timeout)
    }
}

// ============================================================
// Provider Configuration
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    OpenAi,
    Anthropic,
    /// Any OpenAI-compatible endpoint with a custom base URL
    Custom,
    /// Deterministic offline stub, for development and tests
    Stub,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(rename = "type")]
    pub provider_type: ProviderType,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_base: Option<String>,
}

impl ProviderConfig {
    pub fn new(provider_type: ProviderType) -> Self {
        Self {
            provider_type,
            api_key: None,
            api_base: None,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = Some(base.into());
        self
    }

    fn api_key_or_empty(&self) -> &str {
        self.api_key.as_deref().unwrap_or("").trim()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SpeechConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default = "default_transcription_model")]
    pub model: String,
}

fn default_transcription_model() -> String {
    "whisper-1".to_string()
}

/// Build a completion client from configuration.
///
/// Missing credentials yield the unconfigured client rather than a
/// construction error: its calls fail with a clearly-labeled message and
/// each pipeline stage decides whether that is a fallback or a hard error.
pub fn create_completion_provider(config: &ProviderConfig) -> Arc<dyn CompletionProvider> {
    match config.provider_type {
        ProviderType::Stub => {
            tracing::info!("using stub completion provider");
            Arc::new(StubProvider)
        }
        ProviderType::OpenAi => {
            let key = config.api_key_or_empty();
            if key.is_empty() {
                tracing::warn!("openai completion provider has no api key");
                return Arc::new(UnconfiguredProvider);
            }
            let base = config.api_base.as_deref().unwrap_or("https://api.openai.com/v1");
            Arc::new(OpenAiCompatProvider::new(key, base))
        }
        ProviderType::Anthropic => {
            let key = config.api_key_or_empty();
            if key.is_empty() {
                tracing::warn!("anthropic completion provider has no api key");
                return Arc::new(UnconfiguredProvider);
            }
            let base = config.api_base.as_deref().unwrap_or("https://api.anthropic.com");
            Arc::new(AnthropicProvider::new(key, base))
        }
        ProviderType::Custom => {
            let Some(base) = config.api_base.as_deref().filter(|b| !b.trim().is_empty()) else {
                tracing::warn!("custom completion provider has no base url");
                return Arc::new(UnconfiguredProvider);
            };
            let key = config.api_key.as_deref().unwrap_or("unused");
            Arc::new(OpenAiCompatProvider::new(key, base))
        }
    }
}

/// Build a speech-to-text client, or `None` when transcription is disabled
/// or has no credentials. Audio submissions then fail with the distinct
/// "could not process audio" outcome instead of an opaque crash.
pub fn create_speech_provider(config: &SpeechConfig) -> Option<Arc<dyn SpeechProvider>> {
    if !config.enabled {
        return None;
    }
    let key = config.api_key.as_deref().unwrap_or("").trim();
    if key.is_empty() {
        tracing::warn!("transcription enabled but no api key configured");
        return None;
    }
    let base = config.api_base.as_deref().unwrap_or("https://api.openai.com/v1");
    Some(Arc::new(OpenAiCompatProvider::new(key, base)))
}

// ============================================================
// Built-in non-HTTP providers
// ============================================================

/// Stands in when credentials are missing. Every call fails with the same
/// labeled error so callers can surface "service unavailable" instead of
/// crashing.
pub struct UnconfiguredProvider;

#[async_trait]
impl CompletionProvider for UnconfiguredProvider {
    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse> {
        Err(anyhow!("completion service not configured: missing credentials"))
    }

    async fn health(&self) -> Result<()> {
        Err(anyhow!("completion service not configured: missing credentials"))
    }
}

/// Deterministic offline provider. Structured requests get an empty JSON
/// object, which every stage's lenient decoder treats as "nothing useful",
/// so the whole pipeline exercises its fallback paths without a network.
pub struct StubProvider;

#[async_trait]
impl CompletionProvider for StubProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let text = if request.json_output {
            "{}".to_string()
        } else {
            let user_text = request
                .messages
                .last()
                .map(|m| m.content.clone())
                .unwrap_or_default();
            format!("[stub:{}] {}", request.model, user_text)
        };
        Ok(CompletionResponse {
            text,
            input_tokens: None,
            output_tokens: None,
            stop_reason: Some("end_turn".into()),
        })
    }
}
