use ctxbuf_utils::error::ConfigError;

use crate::model::Config;

/// Upper bound on the context-buffer soft cap.
pub const MAX_CONTEXT_FILES_LIMIT: usize = 50;

impl Config {
    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(max) = self.selection.max_context_files {
            if max == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "max_context_files".to_string(),
                    value: "must be greater than 0".to_string(),
                });
            }
            if max > MAX_CONTEXT_FILES_LIMIT {
                return Err(ConfigError::InvalidValue {
                    key: "max_context_files".to_string(),
                    value: format!("exceeds maximum limit of {MAX_CONTEXT_FILES_LIMIT}"),
                });
            }
        }

        if let Some(root) = &self.selection.project_root
            && !(root.starts_with('/') && root.ends_with('/'))
        {
            return Err(ConfigError::InvalidValue {
                key: "project_root".to_string(),
                value: format!("'{root}' must start and end with '/'"),
            });
        }

        if let Some(timeout) = self.llm.timeout_secs {
            if timeout < 5 {
                return Err(ConfigError::InvalidValue {
                    key: "timeout_secs".to_string(),
                    value: "must be at least 5 seconds".to_string(),
                });
            }
            if timeout > 3600 {
                return Err(ConfigError::InvalidValue {
                    key: "timeout_secs".to_string(),
                    value: "exceeds maximum limit of 3600 seconds (1 hour)".to_string(),
                });
            }
        }

        if let Some(provider) = &self.llm.default_provider
            && provider.trim().is_empty()
        {
            return Err(ConfigError::InvalidValue {
                key: "default_provider".to_string(),
                value: "must not be empty".to_string(),
            });
        }

        if let Some(base_url) = self
            .llm
            .anythingllm
            .as_ref()
            .and_then(|a| a.base_url.as_deref())
            && !(base_url.starts_with("http://") || base_url.starts_with("https://"))
        {
            return Err(ConfigError::InvalidValue {
                key: "llm.anythingllm.base_url".to_string(),
                value: format!("'{base_url}' must be an http(s) URL"),
            });
        }

        self.ignore_rules().validate()
    }
}
