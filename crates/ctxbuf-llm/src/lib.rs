//! LLM provider abstraction for context selection
//!
//! Providers expose a model catalogue and build [`LlmBackend`]s. The selector
//! resolves a provider through the [`ProviderRegistry`], a model through
//! [`resolve_model`], and makes exactly one backend invocation.

mod anythingllm;
mod http_client;
mod openai_compat;
mod provider;
mod registry;
mod resolver;
mod types;

pub use anythingllm::{AnythingLlmProvider, PROVIDER_NAME as ANYTHINGLLM_PROVIDER};
pub use ctxbuf_utils::error::LlmError;
pub use openai_compat::{HttpParams, OpenAiCompatBackend};
pub use provider::{Credentials, ModelInfo, Provider, ProviderSetting};
pub use registry::ProviderRegistry;
pub use resolver::{ModelResolution, resolve_model};
pub use types::{LlmBackend, LlmInvocation, LlmResult, Message, Role};

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct NamedProvider(&'static str);

    struct EchoBackend;

    #[async_trait]
    impl LlmBackend for EchoBackend {
        async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
            let user = inv.content_of(Role::User).unwrap_or_default().to_string();
            Ok(LlmResult::new(user, "echo", inv.model))
        }
    }

    #[async_trait]
    impl Provider for NamedProvider {
        fn name(&self) -> &str {
            self.0
        }

        fn static_models(&self) -> Vec<ModelInfo> {
            vec![ModelInfo::new("m", "M", self.0, 1000)]
        }

        async fn dynamic_models(&self, _creds: &Credentials) -> Result<Vec<ModelInfo>, LlmError> {
            Ok(Vec::new())
        }

        fn backend(
            &self,
            _model: &str,
            _creds: &Credentials,
        ) -> Result<Box<dyn LlmBackend>, LlmError> {
            Ok(Box::new(EchoBackend))
        }
    }

    #[test]
    fn test_registry_resolves_by_name_with_default_fallback() {
        let registry = ProviderRegistry::new(Arc::new(NamedProvider("Default")))
            .with_provider(Arc::new(NamedProvider("Other")));

        assert_eq!(registry.resolve("Other").name(), "Other");
        assert_eq!(registry.resolve("Unknown").name(), "Default");
        assert_eq!(registry.names(), vec!["Default", "Other"]);
    }

    #[test]
    fn test_registry_set_default_requires_registered_provider() {
        let mut registry = ProviderRegistry::new(Arc::new(NamedProvider("A")))
            .with_provider(Arc::new(NamedProvider("B")));

        registry.set_default("B").unwrap();
        assert_eq!(registry.resolve("zzz").name(), "B");

        let err = registry.set_default("C").unwrap_err();
        assert!(matches!(err, LlmError::Misconfiguration(msg) if msg.contains("'C'")));
    }

    #[test]
    fn test_registry_from_default_config_uses_anythingllm() {
        let config = ctxbuf_config::Config::builder().build().unwrap();
        let registry = ProviderRegistry::from_config(&config).unwrap();

        assert_eq!(registry.default_provider().name(), ANYTHINGLLM_PROVIDER);
    }

    #[tokio::test]
    async fn test_backend_round_trip_through_provider() {
        let provider = NamedProvider("Echo");
        let backend = provider.backend("m", &Credentials::default()).unwrap();

        let inv = LlmInvocation::new(
            "m",
            std::time::Duration::from_secs(5),
            vec![Message::system("sys"), Message::user("question")],
        );
        let result = backend.invoke(inv).await.unwrap();

        assert_eq!(result.raw_response, "question");
        assert_eq!(result.model_used, "m");
    }
}
