//! OpenAI-compatible chat-completions backend.
//!
//! Used by providers that expose `POST {base}/chat/completions`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use ctxbuf_utils::error::LlmError;

use crate::http_client::HttpClient;
use crate::types::{LlmBackend, LlmInvocation, LlmResult, Message};

/// HTTP request parameters
#[derive(Debug, Clone)]
pub struct HttpParams {
    pub max_tokens: Option<u32>,
    pub temperature: f32,
}

impl Default for HttpParams {
    fn default() -> Self {
        Self {
            max_tokens: None,
            temperature: 0.0,
        }
    }
}

/// Backend speaking the OpenAI chat-completions dialect.
#[derive(Clone)]
pub struct OpenAiCompatBackend {
    client: Arc<HttpClient>,
    provider_name: String,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    default_params: HttpParams,
}

impl OpenAiCompatBackend {
    /// Create a backend for `model` at `api_base` (e.g. `http://host/api/v1`).
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the HTTP client cannot be constructed
    pub fn new(
        provider_name: impl Into<String>,
        api_base: &str,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> Result<Self, LlmError> {
        let client = HttpClient::new()?;

        Ok(Self {
            client: Arc::new(client),
            provider_name: provider_name.into(),
            endpoint: format!("{}/chat/completions", api_base.trim_end_matches('/')),
            api_key: api_key.filter(|k| !k.is_empty()),
            model: model.into(),
            default_params: HttpParams::default(),
        })
    }

    #[must_use]
    pub fn with_params(mut self, params: HttpParams) -> Self {
        self.default_params = params;
        self
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Resolve parameters for this invocation
    ///
    /// `inv.model` overrides the bound model when non-empty; `max_tokens` and
    /// `temperature` in `inv.metadata` override the defaults.
    fn resolve_params(&self, inv: &LlmInvocation) -> (String, HttpParams) {
        let model = if inv.model.is_empty() {
            self.model.clone()
        } else {
            inv.model.clone()
        };

        let max_tokens = inv
            .metadata
            .get("max_tokens")
            .and_then(|v| v.as_u64())
            .and_then(|v| u32::try_from(v).ok())
            .or(self.default_params.max_tokens);

        let temperature = inv
            .metadata
            .get("temperature")
            .and_then(|v| v.as_f64())
            .map(|v| v as f32)
            .unwrap_or(self.default_params.temperature);

        (
            model,
            HttpParams {
                max_tokens,
                temperature,
            },
        )
    }

    fn convert_messages(messages: &[Message]) -> Vec<OpenAiMessage> {
        messages
            .iter()
            .map(|msg| OpenAiMessage {
                role: msg.role.as_str().to_string(),
                content: msg.content.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl LlmBackend for OpenAiCompatBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let (model, params) = self.resolve_params(&inv);

        debug!(
            provider = %self.provider_name,
            model = %model,
            timeout_secs = inv.timeout.as_secs(),
            "Invoking OpenAI-compatible backend"
        );

        let request_body = ChatCompletionRequest {
            model: model.clone(),
            messages: Self::convert_messages(&inv.messages),
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            stream: false,
        };

        let mut request = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&request_body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = self
            .client
            .execute(request, inv.timeout, &self.provider_name)
            .await?;

        let body: ChatCompletionResponse = response.json().await.map_err(|e| {
            LlmError::Transport(format!(
                "Failed to parse {} response: {e}",
                self.provider_name
            ))
        })?;

        let choice = body.choices.into_iter().next().ok_or_else(|| {
            LlmError::Transport(format!("{} response missing choices[0]", self.provider_name))
        })?;

        let content = choice.message.content.ok_or_else(|| {
            LlmError::Transport(format!(
                "{} response missing content in choices[0]",
                self.provider_name
            ))
        })?;

        let mut result = LlmResult::new(content, self.provider_name.clone(), model);
        if let Some(usage) = body.usage {
            result = result.with_tokens(usage.prompt_tokens, usage.completion_tokens);
        }
        if let Some(reason) = choice.finish_reason {
            result = result.with_extension("finish_reason", serde_json::Value::String(reason));
        }

        debug!(
            provider = %self.provider_name,
            tokens_input = ?result.tokens_input,
            tokens_output = ?result.tokens_output,
            "Invocation completed"
        );

        Ok(result)
    }
}

#[derive(Debug, Clone, Serialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}
