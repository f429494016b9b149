use std::collections::HashMap;
use std::time::Duration;

use ctxbuf_utils::error::ConfigError;
use ctxbuf_utils::types::ConfigSource;

use crate::model::{AnythingLlmConfig, Config, LlmConfig, SelectionConfig};

impl Config {
    /// Create a builder for programmatic configuration.
    ///
    /// The builder never reads environment variables or config files.
    ///
    /// ```rust
    /// use ctxbuf_config::Config;
    /// use std::time::Duration;
    ///
    /// let config = Config::builder()
    ///     .max_context_files(8)
    ///     .timeout(Duration::from_secs(60))
    ///     .build()
    ///     .expect("valid config");
    /// assert_eq!(config.max_context_files(), 8);
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Fluent builder for [`Config`].
///
/// Values set here are attributed to [`ConfigSource::Programmatic`].
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    project_root: Option<String>,
    max_context_files: Option<usize>,
    ignore_patterns: Option<Vec<String>>,
    extra_ignore_patterns: Vec<String>,
    default_provider: Option<String>,
    default_model: Option<String>,
    timeout: Option<Duration>,
    anythingllm: Option<AnythingLlmConfig>,
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn project_root(mut self, root: impl Into<String>) -> Self {
        self.project_root = Some(root.into());
        self
    }

    #[must_use]
    pub fn max_context_files(mut self, max: usize) -> Self {
        self.max_context_files = Some(max);
        self
    }

    /// Replace the canonical ignore list.
    #[must_use]
    pub fn ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = Some(patterns);
        self
    }

    #[must_use]
    pub fn extra_ignore_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.extra_ignore_patterns.push(pattern.into());
        self
    }

    #[must_use]
    pub fn default_provider(mut self, provider: impl Into<String>) -> Self {
        self.default_provider = Some(provider.into());
        self
    }

    #[must_use]
    pub fn default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn anythingllm(mut self, settings: AnythingLlmConfig) -> Self {
        self.anythingllm = Some(settings);
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<Config, ConfigError> {
        let mut source_attribution = HashMap::new();
        let mut attribute = |key: &str, set: bool| {
            let source = if set {
                ConfigSource::Programmatic
            } else {
                ConfigSource::Default
            };
            source_attribution.insert(key.to_string(), source);
        };

        attribute("project_root", self.project_root.is_some());
        attribute("max_context_files", self.max_context_files.is_some());
        attribute("ignore_patterns", self.ignore_patterns.is_some());
        attribute("default_provider", self.default_provider.is_some());
        attribute("default_model", self.default_model.is_some());
        attribute("timeout_secs", self.timeout.is_some());
        if !self.extra_ignore_patterns.is_empty() {
            attribute("extra_ignore_patterns", true);
        }
        if self.anythingllm.is_some() {
            attribute("anythingllm", true);
        }

        let config = Config {
            selection: SelectionConfig {
                project_root: self.project_root,
                max_context_files: self.max_context_files,
                ignore_patterns: self.ignore_patterns,
                extra_ignore_patterns: self.extra_ignore_patterns,
            },
            llm: LlmConfig {
                default_provider: self.default_provider,
                default_model: self.default_model,
                timeout_secs: self.timeout.map(|d| d.as_secs()),
                anythingllm: self.anythingllm,
            },
            source_attribution,
        };

        config.validate()?;
        Ok(config)
    }
}
