use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use ctxbuf_utils::types::ConfigSource;

pub const DEFAULT_PROVIDER: &str = "AnythingLLM";
pub const DEFAULT_MODEL: &str = "default";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_ANYTHINGLLM_BASE_URL: &str = "http://localhost:3001/";
pub const DEFAULT_ANYTHINGLLM_API_KEY_ENV: &str = "ANYTHINGLLM_API_KEY";

/// Configuration for ctxbuf operations.
///
/// Hierarchical with precedence CLI arguments > config file > built-in
/// defaults. Every value tracks its source for `effective_config()`.
///
/// # Configuration File Format
///
/// ```toml
/// [selection]
/// project_root = "/home/project/"
/// max_context_files = 5
/// extra_ignore_patterns = ["**/*.snap"]
///
/// [llm]
/// default_provider = "AnythingLLM"
/// default_model = "default"
/// timeout_secs = 120
///
/// [llm.anythingllm]
/// base_url = "http://localhost:3001/"
/// api_key_env = "ANYTHINGLLM_API_KEY"
/// running_in_docker = false
/// ```
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub selection: SelectionConfig,
    pub llm: LlmConfig,
    pub source_attribution: HashMap<String, ConfigSource>,
}

/// `[selection]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SelectionConfig {
    pub project_root: Option<String>,
    pub max_context_files: Option<usize>,
    /// Replaces the canonical ignore list when set.
    pub ignore_patterns: Option<Vec<String>>,
    #[serde(default)]
    pub extra_ignore_patterns: Vec<String>,
}

/// `[llm]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    pub default_provider: Option<String>,
    pub default_model: Option<String>,
    pub timeout_secs: Option<u64>,
    pub anythingllm: Option<AnythingLlmConfig>,
}

/// `[llm.anythingllm]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnythingLlmConfig {
    pub base_url: Option<String>,
    pub api_key_env: Option<String>,
    pub running_in_docker: Option<bool>,
}

/// Command-line overrides, applied on top of the config file.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config_path: Option<PathBuf>,
    pub project_root: Option<String>,
    pub max_context_files: Option<usize>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TomlConfig {
    pub selection: Option<SelectionConfig>,
    pub llm: Option<LlmConfig>,
}
