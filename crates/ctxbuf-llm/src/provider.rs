//! Provider abstraction: model catalogue plus backend construction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use ctxbuf_utils::error::LlmError;

use crate::types::LlmBackend;

/// One model offered by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub name: String,
    pub label: String,
    pub provider: String,
    pub max_token_allowed: u64,
}

impl ModelInfo {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        provider: impl Into<String>,
        max_token_allowed: u64,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            provider: provider.into(),
            max_token_allowed,
        }
    }
}

/// Per-provider user settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSetting {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

/// Caller-supplied credentials and environment for provider calls.
///
/// `api_keys` and `provider_settings` are keyed by provider name;
/// `server_env` carries variables such as `ANYTHINGLLM_API_BASE_URL`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    #[serde(default)]
    pub api_keys: HashMap<String, String>,
    #[serde(default)]
    pub provider_settings: HashMap<String, ProviderSetting>,
    #[serde(default)]
    pub server_env: HashMap<String, String>,
}

impl Credentials {
    #[must_use]
    pub fn with_api_key(mut self, provider: impl Into<String>, key: impl Into<String>) -> Self {
        self.api_keys.insert(provider.into(), key.into());
        self
    }

    #[must_use]
    pub fn with_server_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.server_env.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_provider_setting(
        mut self,
        provider: impl Into<String>,
        setting: ProviderSetting,
    ) -> Self {
        self.provider_settings.insert(provider.into(), setting);
        self
    }

    #[must_use]
    pub fn setting_for(&self, provider: &str) -> Option<&ProviderSetting> {
        self.provider_settings.get(provider)
    }

    /// Look up `key` in the server environment, then the process environment.
    #[must_use]
    pub fn env_value(&self, key: &str) -> Option<String> {
        self.server_env
            .get(key)
            .filter(|v| !v.is_empty())
            .cloned()
            .or_else(|| std::env::var(key).ok().filter(|v| !v.is_empty()))
    }
}

/// A model provider.
#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    /// Models known without a network call.
    fn static_models(&self) -> Vec<ModelInfo>;

    /// Models listed by the provider endpoint.
    async fn dynamic_models(&self, credentials: &Credentials) -> Result<Vec<ModelInfo>, LlmError>;

    /// Construct a backend bound to `model`.
    fn backend(
        &self,
        model: &str,
        credentials: &Credentials,
    ) -> Result<Box<dyn LlmBackend>, LlmError>;
}
