//! Three-stage model resolution: static list, dynamic list, first of combined.

use tracing::{debug, warn};

use ctxbuf_utils::error::LlmError;

use crate::provider::{Credentials, ModelInfo, Provider};

/// Outcome of [`resolve_model`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelResolution {
    /// The requested model exists.
    Found(ModelInfo),
    /// The requested model is unknown; the first listed model is used.
    Fallback { requested: String, model: ModelInfo },
    /// The provider lists no models at all.
    Unavailable { provider: String },
}

impl ModelResolution {
    /// The model to invoke, if any.
    #[must_use]
    pub fn model(&self) -> Option<&ModelInfo> {
        match self {
            Self::Found(model) | Self::Fallback { model, .. } => Some(model),
            Self::Unavailable { .. } => None,
        }
    }

    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Resolve `requested` against `provider`'s models.
///
/// The dynamic list is only fetched when the static list misses. Errors from
/// the dynamic fetch propagate unchanged.
pub async fn resolve_model(
    provider: &dyn Provider,
    requested: &str,
    credentials: &Credentials,
) -> Result<ModelResolution, LlmError> {
    let static_models = provider.static_models();
    if let Some(model) = static_models.iter().find(|m| m.name == requested) {
        debug!(provider = %provider.name(), model = %requested, "Resolved static model");
        return Ok(ModelResolution::Found(model.clone()));
    }

    let dynamic_models = provider.dynamic_models(credentials).await?;
    let mut models = static_models;
    models.extend(dynamic_models);

    if let Some(model) = models.iter().find(|m| m.name == requested) {
        debug!(provider = %provider.name(), model = %requested, "Resolved dynamic model");
        return Ok(ModelResolution::Found(model.clone()));
    }

    match models.into_iter().next() {
        Some(first) => {
            warn!(
                provider = %provider.name(),
                requested = %requested,
                model = %first.name,
                "MODEL [{}] not found in provider [{}]. Falling back to first model. {}",
                requested,
                provider.name(),
                first.name
            );
            Ok(ModelResolution::Fallback {
                requested: requested.to_string(),
                model: first,
            })
        }
        None => Ok(ModelResolution::Unavailable {
            provider: provider.name().to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LlmBackend, LlmInvocation, LlmResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockProvider {
        static_models: Vec<ModelInfo>,
        dynamic: Result<Vec<ModelInfo>, String>,
        dynamic_calls: AtomicUsize,
    }

    impl MockProvider {
        fn new(static_names: &[&str], dynamic_names: &[&str]) -> Self {
            Self {
                static_models: static_names.iter().map(|n| model(n)).collect(),
                dynamic: Ok(dynamic_names.iter().map(|n| model(n)).collect()),
                dynamic_calls: AtomicUsize::new(0),
            }
        }
    }

    fn model(name: &str) -> ModelInfo {
        ModelInfo::new(name, name, "Mock", 8000)
    }

    struct NeverBackend;

    #[async_trait]
    impl LlmBackend for NeverBackend {
        async fn invoke(&self, _inv: LlmInvocation) -> Result<LlmResult, LlmError> {
            Err(LlmError::Unsupported("not used".to_string()))
        }
    }

    #[async_trait]
    impl Provider for MockProvider {
        fn name(&self) -> &str {
            "Mock"
        }

        fn static_models(&self) -> Vec<ModelInfo> {
            self.static_models.clone()
        }

        async fn dynamic_models(&self, _creds: &Credentials) -> Result<Vec<ModelInfo>, LlmError> {
            self.dynamic_calls.fetch_add(1, Ordering::SeqCst);
            self.dynamic.clone().map_err(LlmError::Transport)
        }

        fn backend(
            &self,
            _model: &str,
            _creds: &Credentials,
        ) -> Result<Box<dyn LlmBackend>, LlmError> {
            Ok(Box::new(NeverBackend))
        }
    }

    #[tokio::test]
    async fn test_static_hit_skips_dynamic_fetch() {
        let provider = MockProvider::new(&["a", "b"], &["c"]);
        let resolution = resolve_model(&provider, "b", &Credentials::default())
            .await
            .unwrap();

        assert_eq!(resolution, ModelResolution::Found(model("b")));
        assert_eq!(provider.dynamic_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dynamic_hit() {
        let provider = MockProvider::new(&["a"], &["c"]);
        let resolution = resolve_model(&provider, "c", &Credentials::default())
            .await
            .unwrap();

        assert_eq!(resolution, ModelResolution::Found(model("c")));
        assert_eq!(provider.dynamic_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fallback_to_first_of_combined_list() {
        let provider = MockProvider::new(&[], &["x", "y"]);
        let resolution = resolve_model(&provider, "missing", &Credentials::default())
            .await
            .unwrap();

        assert!(resolution.is_fallback());
        assert_eq!(resolution.model(), Some(&model("x")));
    }

    #[tokio::test]
    async fn test_empty_lists_are_unavailable() {
        let provider = MockProvider::new(&[], &[]);
        let resolution = resolve_model(&provider, "any", &Credentials::default())
            .await
            .unwrap();

        assert_eq!(
            resolution,
            ModelResolution::Unavailable {
                provider: "Mock".to_string()
            }
        );
        assert_eq!(resolution.model(), None);
    }

    #[tokio::test]
    async fn test_dynamic_fetch_errors_propagate() {
        let provider = MockProvider {
            static_models: vec![],
            dynamic: Err("connection refused".to_string()),
            dynamic_calls: AtomicUsize::new(0),
        };

        let err = resolve_model(&provider, "any", &Credentials::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Transport(msg) if msg == "connection refused"));
    }
}
