//! Configuration management for ctxbuf
//!
//! Hierarchical configuration with discovery and precedence CLI > file >
//! defaults. The TOML file carries `[selection]` and `[llm]` sections.

mod builder;
mod discovery;
mod model;
mod sources;
mod validation;

use std::time::Duration;

pub use builder::ConfigBuilder;
pub use ctxbuf_utils::types::ConfigSource;
pub use discovery::{CONFIG_DIR, CONFIG_FILE};
pub use model::*;
pub use validation::MAX_CONTEXT_FILES_LIMIT;

use ctxbuf_selectors::IgnoreRules;
use ctxbuf_utils::types::{DEFAULT_MAX_CONTEXT_FILES, PROJECT_ROOT};

/// AnythingLLM settings with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAnythingLlm {
    pub base_url: String,
    pub api_key_env: String,
    pub running_in_docker: bool,
}

impl Config {
    #[must_use]
    pub fn project_root(&self) -> &str {
        self.selection.project_root.as_deref().unwrap_or(PROJECT_ROOT)
    }

    #[must_use]
    pub fn max_context_files(&self) -> usize {
        self.selection
            .max_context_files
            .unwrap_or(DEFAULT_MAX_CONTEXT_FILES)
    }

    #[must_use]
    pub fn ignore_rules(&self) -> IgnoreRules {
        IgnoreRules {
            patterns: self.selection.ignore_patterns.clone(),
            extra: self.selection.extra_ignore_patterns.clone(),
        }
    }

    #[must_use]
    pub fn default_provider(&self) -> &str {
        self.llm
            .default_provider
            .as_deref()
            .unwrap_or(DEFAULT_PROVIDER)
    }

    #[must_use]
    pub fn default_model(&self) -> &str {
        self.llm.default_model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.llm.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    #[must_use]
    pub fn anythingllm(&self) -> ResolvedAnythingLlm {
        let section = self.llm.anythingllm.clone().unwrap_or_default();
        ResolvedAnythingLlm {
            base_url: section
                .base_url
                .unwrap_or_else(|| DEFAULT_ANYTHINGLLM_BASE_URL.to_string()),
            api_key_env: section
                .api_key_env
                .unwrap_or_else(|| DEFAULT_ANYTHINGLLM_API_KEY_ENV.to_string()),
            running_in_docker: section.running_in_docker.unwrap_or(false),
        }
    }
}
