use std::sync::Arc;
use tracing::debug;

use ctxbuf_config::Config;
use ctxbuf_utils::error::LlmError;

use crate::anythingllm::AnythingLlmProvider;
use crate::provider::Provider;

/// Named providers with a default fallback.
#[derive(Clone)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn Provider>>,
    default_index: usize,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .field("default", &self.default_provider().name())
            .finish()
    }
}

impl ProviderRegistry {
    /// Registry holding a single provider, which is also the default.
    #[must_use]
    pub fn new(default: Arc<dyn Provider>) -> Self {
        Self {
            providers: vec![default],
            default_index: 0,
        }
    }

    /// Registry with the built-in providers, defaulting to the configured one.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the configured default provider
    /// is not registered or a provider cannot be constructed.
    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        let anythingllm: Arc<dyn Provider> = Arc::new(AnythingLlmProvider::from_config(config)?);
        let mut registry = Self::new(anythingllm);
        registry.set_default(config.default_provider())?;
        Ok(registry)
    }

    /// Add a provider. A provider with the same name is replaced.
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn Provider>) -> Self {
        match self
            .providers
            .iter()
            .position(|p| p.name() == provider.name())
        {
            Some(index) => self.providers[index] = provider,
            None => self.providers.push(provider),
        }
        self
    }

    /// Make the provider named `name` the fallback.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` when no provider named `name` is registered.
    pub fn set_default(&mut self, name: &str) -> Result<(), LlmError> {
        let index = self
            .providers
            .iter()
            .position(|p| p.name() == name)
            .ok_or_else(|| {
                LlmError::Misconfiguration(format!(
                    "Default provider '{name}' is not registered (available: {})",
                    self.names().join(", ")
                ))
            })?;
        self.default_index = index;
        Ok(())
    }

    #[must_use]
    pub fn default_provider(&self) -> Arc<dyn Provider> {
        Arc::clone(&self.providers[self.default_index])
    }

    /// Provider registered as `name`, or the default provider.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Arc<dyn Provider> {
        match self.providers.iter().find(|p| p.name() == name) {
            Some(provider) => Arc::clone(provider),
            None => {
                let fallback = self.default_provider();
                debug!(
                    requested = %name,
                    provider = %fallback.name(),
                    "Unknown provider, using default"
                );
                fallback
            }
        }
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }
}
