//! AnythingLLM provider: dynamic model listing plus OpenAI-compatible generation.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

use ctxbuf_config::Config;
use ctxbuf_utils::error::LlmError;
use ctxbuf_utils::redaction::redact_error_message;

use crate::http_client::HttpClient;
use crate::openai_compat::OpenAiCompatBackend;
use crate::provider::{Credentials, ModelInfo, Provider};
use crate::types::LlmBackend;

pub const PROVIDER_NAME: &str = "AnythingLLM";
pub const BASE_URL_KEY: &str = "ANYTHINGLLM_API_BASE_URL";
pub const API_KEY_KEY: &str = "ANYTHINGLLM_API_KEY";
const DOCKER_ENV_KEY: &str = "RUNNING_IN_DOCKER";
const DOCKER_HOST: &str = "host.docker.internal";
const MAX_TOKENS: u64 = 200_000;
const MODEL_LIST_TIMEOUT: Duration = Duration::from_secs(30);

/// AnythingLLM provider.
pub struct AnythingLlmProvider {
    client: Arc<HttpClient>,
    base_url: String,
    api_key_env: String,
    running_in_docker: bool,
}

impl AnythingLlmProvider {
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the HTTP client cannot be constructed
    pub fn new(
        base_url: impl Into<String>,
        api_key_env: impl Into<String>,
        running_in_docker: bool,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: Arc::new(HttpClient::new()?),
            base_url: base_url.into(),
            api_key_env: api_key_env.into(),
            running_in_docker,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        let settings = config.anythingllm();
        Self::new(
            settings.base_url,
            settings.api_key_env,
            settings.running_in_docker,
        )
    }

    /// The single model reported when listing fails or comes back empty.
    #[must_use]
    pub fn fallback_model() -> ModelInfo {
        ModelInfo::new("default", "Default AnythingLLM Model", PROVIDER_NAME, MAX_TOKENS)
    }

    /// Base URL with Docker host rewriting applied, without trailing slash.
    ///
    /// Precedence: provider settings, `ANYTHINGLLM_API_BASE_URL` (server
    /// env, then process env), configured base URL.
    pub fn base_url(&self, credentials: &Credentials) -> Result<String, LlmError> {
        let base = credentials
            .setting_for(PROVIDER_NAME)
            .and_then(|s| s.base_url.clone())
            .filter(|s| !s.is_empty())
            .or_else(|| credentials.env_value(BASE_URL_KEY))
            .unwrap_or_else(|| self.base_url.clone());

        if base.trim().is_empty() {
            return Err(LlmError::Misconfiguration(
                "No baseUrl found for AnythingLLM provider".to_string(),
            ));
        }

        let base = if self.in_docker(credentials) {
            base.replacen("localhost", DOCKER_HOST, 1)
                .replacen("127.0.0.1", DOCKER_HOST, 1)
        } else {
            base
        };

        Ok(base.trim_end_matches('/').to_string())
    }

    /// API key from the caller's keys, then `ANYTHINGLLM_API_KEY`, then the
    /// configured environment variable.
    #[must_use]
    pub fn api_key(&self, credentials: &Credentials) -> Option<String> {
        credentials
            .api_keys
            .get(PROVIDER_NAME)
            .filter(|k| !k.is_empty())
            .cloned()
            .or_else(|| credentials.env_value(API_KEY_KEY))
            .or_else(|| {
                (self.api_key_env != API_KEY_KEY)
                    .then(|| credentials.env_value(&self.api_key_env))
                    .flatten()
            })
    }

    fn in_docker(&self, credentials: &Credentials) -> bool {
        self.running_in_docker
            || credentials
                .env_value(DOCKER_ENV_KEY)
                .is_some_and(|v| v == "true")
    }

    async fn fetch_models(
        &self,
        base_url: &str,
        api_key: Option<&str>,
    ) -> Result<Vec<ModelInfo>, LlmError> {
        let mut request = self
            .client
            .get(&format!("{base_url}/api/v1/models"))
            .header("Content-Type", "application/json");
        if let Some(key) = api_key {
            request = request.bearer_auth(key);
        }

        let response = self
            .client
            .execute(request, MODEL_LIST_TIMEOUT, PROVIDER_NAME)
            .await?;
        let body: ModelsResponse = response.json().await.map_err(|e| {
            LlmError::Transport(format!("Failed to parse AnythingLLM model list: {e}"))
        })?;

        Ok(body
            .models
            .into_iter()
            .map(|m| {
                let label = m.name.unwrap_or_else(|| m.id.clone());
                ModelInfo::new(m.id, label, PROVIDER_NAME, MAX_TOKENS)
            })
            .collect())
    }
}

#[async_trait]
impl Provider for AnythingLlmProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn static_models(&self) -> Vec<ModelInfo> {
        Vec::new()
    }

    async fn dynamic_models(&self, credentials: &Credentials) -> Result<Vec<ModelInfo>, LlmError> {
        let base_url = self.base_url(credentials)?;
        let api_key = self.api_key(credentials);

        match self.fetch_models(&base_url, api_key.as_deref()).await {
            Ok(models) if models.is_empty() => {
                debug!(provider = PROVIDER_NAME, "No models listed, using default model");
                Ok(vec![Self::fallback_model()])
            }
            Ok(models) => Ok(models),
            Err(e) => {
                error!(
                    provider = PROVIDER_NAME,
                    error = %redact_error_message(&e.to_string()),
                    "Error fetching AnythingLLM models"
                );
                Ok(vec![Self::fallback_model()])
            }
        }
    }

    fn backend(
        &self,
        model: &str,
        credentials: &Credentials,
    ) -> Result<Box<dyn LlmBackend>, LlmError> {
        let base_url = self.base_url(credentials)?;
        debug!(provider = PROVIDER_NAME, base_url = %redact_error_message(&base_url), "AnythingLLM base URL");

        let backend = OpenAiCompatBackend::new(
            PROVIDER_NAME,
            &format!("{base_url}/api/v1"),
            self.api_key(credentials),
            model,
        )?;
        Ok(Box::new(backend))
    }
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    #[serde(default)]
    models: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
    #[serde(default)]
    name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderSetting;

    fn provider(base_url: &str, docker: bool) -> AnythingLlmProvider {
        AnythingLlmProvider::new(base_url, "CTXBUF_TEST_ANYTHINGLLM_KEY", docker).unwrap()
    }

    #[test]
    fn test_base_url_precedence() {
        let provider = provider("http://configured:3001/", false);

        let creds = Credentials::default();
        assert_eq!(provider.base_url(&creds).unwrap(), "http://configured:3001");

        let creds = Credentials::default().with_server_env(BASE_URL_KEY, "http://env:3001");
        assert_eq!(provider.base_url(&creds).unwrap(), "http://env:3001");

        let creds = creds.with_provider_setting(
            PROVIDER_NAME,
            ProviderSetting {
                base_url: Some("http://settings:3001/".to_string()),
                enabled: Some(true),
            },
        );
        assert_eq!(provider.base_url(&creds).unwrap(), "http://settings:3001");
    }

    #[test]
    fn test_docker_rewrites_loopback_hosts() {
        let creds = Credentials::default();
        assert_eq!(
            provider("http://localhost:3001/", true)
                .base_url(&creds)
                .unwrap(),
            "http://host.docker.internal:3001"
        );

        let creds = Credentials::default().with_server_env("RUNNING_IN_DOCKER", "true");
        assert_eq!(
            provider("http://127.0.0.1:3001", false)
                .base_url(&creds)
                .unwrap(),
            "http://host.docker.internal:3001"
        );
    }

    #[test]
    fn test_missing_base_url_is_misconfiguration() {
        let err = provider("", false)
            .base_url(&Credentials::default())
            .unwrap_err();
        assert!(matches!(err, LlmError::Misconfiguration(msg) if msg.contains("No baseUrl")));
    }

    #[test]
    fn test_api_key_lookup_order() {
        let provider = provider("http://localhost:3001/", false);

        let creds = Credentials::default()
            .with_server_env(API_KEY_KEY, "from-env")
            .with_api_key(PROVIDER_NAME, "from-keys");
        assert_eq!(provider.api_key(&creds).as_deref(), Some("from-keys"));

        let creds = Credentials::default().with_server_env(API_KEY_KEY, "from-env");
        assert_eq!(provider.api_key(&creds).as_deref(), Some("from-env"));

        let creds =
            Credentials::default().with_server_env("CTXBUF_TEST_ANYTHINGLLM_KEY", "from-custom");
        assert_eq!(provider.api_key(&creds).as_deref(), Some("from-custom"));
    }

    #[test]
    fn test_model_list_mapping() {
        let body: ModelsResponse = serde_json::from_str(
            r#"{"models":[{"id":"workspace-a","name":"Workspace A"},{"id":"workspace-b"}]}"#,
        )
        .unwrap();
        assert_eq!(body.models.len(), 2);
        assert_eq!(body.models[1].name, None);

        let empty: ModelsResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.models.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_yields_default_model() {
        let provider = provider("http://127.0.0.1:9/", false);
        let models = provider
            .dynamic_models(&Credentials::default())
            .await
            .unwrap();

        assert_eq!(models, vec![AnythingLlmProvider::fallback_model()]);
        assert_eq!(models[0].label, "Default AnythingLLM Model");
        assert_eq!(models[0].max_token_allowed, 200_000);
    }

    #[test]
    fn test_backend_targets_openai_compatible_api() {
        let provider = provider("http://localhost:3001/", false);
        assert!(provider.backend("default", &Credentials::default()).is_ok());
    }
}
