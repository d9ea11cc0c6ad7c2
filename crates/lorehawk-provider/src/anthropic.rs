use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::{CompletionProvider, CompletionRequest, CompletionResponse, ProviderErrorKind};

/// Client for the Anthropic messages API.
///
/// The messages API has no structured-output switch, so the JSON hint is
/// honored by appending a strict-JSON instruction to the system prompt.
#[derive(Debug, Clone)]
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
}

impl AnthropicProvider {
    pub fn new(api_key: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    pub(crate) fn to_api_request(request: CompletionRequest) -> ApiRequest {
        let system = match (request.system, request.json_output) {
            (Some(system), true) => Some(format!(
                "{system}\n\nRespond with a single valid JSON value and nothing else."
            )),
            (None, true) => {
                Some("Respond with a single valid JSON value and nothing else.".to_string())
            }
            (system, false) => system,
        };

        ApiRequest {
            model: request.model,
            system,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: request
                .messages
                .into_iter()
                .map(|m| ApiMessage {
                    role: m.role,
                    content: m.content,
                })
                .collect(),
        }
    }
}

#[async_trait]
impl CompletionProvider for AnthropicProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let url = format!("{}/v1/messages", self.api_base);
        let payload = Self::to_api_request(request);

        let resp = match self
            .client
            .post(url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&payload)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                return Err(anyhow!(
                    "completion api error (timeout) [retryable]: request timed out after 60s"
                ));
            }
            Err(e) if e.is_connect() => {
                return Err(anyhow!("completion api error (connect) [retryable]: {e}"));
            }
            Err(e) => return Err(e.into()),
        };

        let status = resp.status();
        if status != StatusCode::OK {
            let text = resp.text().await?;
            let parsed = serde_json::from_str::<ApiError>(&text).ok();
            return Err(format_api_error(status, parsed));
        }

        let body: ApiResponse = resp.json().await?;
        let text = body
            .content
            .iter()
            .filter_map(|block| block.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n");

        Ok(CompletionResponse {
            text,
            input_tokens: body.usage.as_ref().map(|u| u.input_tokens),
            output_tokens: body.usage.as_ref().map(|u| u.output_tokens),
            stop_reason: body.stop_reason,
        })
    }
}

fn format_api_error(status: StatusCode, parsed: Option<ApiError>) -> anyhow::Error {
    let kind = ProviderErrorKind::from_status(status);
    let retryable = if kind.is_retryable() {
        " [retryable]"
    } else {
        ""
    };
    if let Some(api_error) = parsed {
        anyhow!(
            "completion api error ({status}){retryable}: {} ({})",
            api_error.error.message,
            api_error.error.r#type
        )
    } else {
        anyhow!("completion api error ({status}){retryable}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ApiRequest {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub messages: Vec<ApiMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ApiMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ApiResponse {
    pub content: Vec<ApiContentBlock>,
    #[serde(default)]
    pub usage: Option<ApiUsage>,
    #[serde(default)]
    pub stop_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ApiContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ApiUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ApiErrorDetail {
    #[serde(rename = "type")]
    pub r#type: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_trims_trailing_slash() {
        let provider = AnthropicProvider::new("test-key", "https://api.anthropic.com/");
        assert_eq!(provider.api_base, "https://api.anthropic.com");
        assert_eq!(provider.api_key, "test-key");
    }

    #[test]
    fn api_request_serialization_shape() {
        let req = CompletionRequest::simple(
            "claude-3-5-haiku-latest".into(),
            Some("system prompt".into()),
            "hello".into(),
        )
        .with_max_tokens(1024)
        .with_temperature(0.5);
        let api = AnthropicProvider::to_api_request(req);
        let value = serde_json::to_value(api).unwrap();
        assert_eq!(value["model"], "claude-3-5-haiku-latest");
        assert_eq!(value["system"], "system prompt");
        assert_eq!(value["max_tokens"], 1024);
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "hello");
    }

    #[test]
    fn json_hint_extends_system_prompt() {
        let req = CompletionRequest::simple("m".into(), Some("classify".into()), "hi".into())
            .with_json_output();
        let api = AnthropicProvider::to_api_request(req);
        let system = api.system.unwrap();
        assert!(system.starts_with("classify"));
        assert!(system.contains("valid JSON"));
    }

    #[test]
    fn json_hint_without_system_still_instructs() {
        let req = CompletionRequest::simple("m".into(), None, "hi".into()).with_json_output();
        let api = AnthropicProvider::to_api_request(req);
        assert!(api.system.unwrap().contains("valid JSON"));
    }

    #[test]
    fn api_response_joins_text_blocks() {
        let raw = serde_json::json!({
            "content": [
                {"type": "text", "text": "line 1"},
                {"type": "text", "text": "line 2"}
            ],
            "usage": {"input_tokens": 12, "output_tokens": 34},
            "stop_reason": "end_turn"
        });
        let parsed: ApiResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.content.len(), 2);
        assert_eq!(parsed.usage.as_ref().map(|u| u.output_tokens), Some(34));
    }

    #[test]
    fn api_error_deserialization() {
        let raw = serde_json::json!({
            "type": "error",
            "error": {
                "type": "invalid_request_error",
                "message": "messages: field required"
            }
        });
        let parsed: ApiError = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.error.r#type, "invalid_request_error");
    }

    #[test]
    fn format_api_error_marks_server_errors_retryable() {
        let err = format_api_error(StatusCode::INTERNAL_SERVER_ERROR, None);
        assert!(err.to_string().contains("[retryable]"));
        let err = format_api_error(StatusCode::BAD_REQUEST, None);
        assert!(!err.to_string().contains("[retryable]"));
    }
}
