use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use ctxbuf_utils::types::ConfigSource;

use crate::model::{CliArgs, Config, LlmConfig, SelectionConfig, TomlConfig};

/// Directory holding project-level configuration.
pub const CONFIG_DIR: &str = ".ctxbuf";
pub const CONFIG_FILE: &str = "config.toml";

impl Config {
    /// Discover and load configuration with precedence: CLI > file > defaults.
    ///
    /// Without an explicit `--config` path, searches upward from the current
    /// directory and then falls back to the user config directory
    /// (`~/.config/ctxbuf/config.toml` on Linux).
    pub fn discover(cli_args: &CliArgs) -> Result<Self> {
        let start_dir = std::env::current_dir().context("Failed to get current directory")?;
        let config_path =
            Self::resolve_config_path(&start_dir, cli_args, Self::user_config_file())?;
        let resolved = CliArgs {
            config_path,
            ..cli_args.clone()
        };
        Self::discover_from(&start_dir, &resolved)
    }

    /// The config file to load: the explicit path, else the nearest project
    /// file above `start_dir`, else `user_config`.
    pub(crate) fn resolve_config_path(
        start_dir: &Path,
        cli_args: &CliArgs,
        user_config: Option<PathBuf>,
    ) -> Result<Option<PathBuf>> {
        if let Some(explicit) = &cli_args.config_path {
            return Ok(Some(explicit.clone()));
        }
        if let Some(project) = Self::discover_config_file_from(start_dir)? {
            return Ok(Some(project));
        }
        if let Some(user_path) = &user_config {
            debug!(path = %user_path.display(), "Using user-level configuration");
        }
        Ok(user_config)
    }

    /// Discover and load configuration starting from a specific directory.
    ///
    /// Path-driven variant used by tests; it never consults the user config
    /// directory.
    pub fn discover_from(start_dir: &Path, cli_args: &CliArgs) -> Result<Self> {
        let mut source_attribution = HashMap::new();
        let mut selection = SelectionConfig::default();
        let mut llm = LlmConfig::default();

        for key in [
            "project_root",
            "max_context_files",
            "ignore_patterns",
            "default_provider",
            "default_model",
            "timeout_secs",
        ] {
            source_attribution.insert(key.to_string(), ConfigSource::Default);
        }

        let config_path = match &cli_args.config_path {
            Some(explicit) => Some(explicit.clone()),
            None => Self::discover_config_file_from(start_dir)?,
        };

        if let Some(path) = &config_path {
            let file_config = Self::load_config_file(path)
                .with_context(|| format!("Failed to load config file: {}", path.display()))?;
            debug!(path = %path.display(), "Loaded configuration file");

            if let Some(file_selection) = file_config.selection {
                if file_selection.project_root.is_some() {
                    selection.project_root = file_selection.project_root;
                    source_attribution.insert("project_root".to_string(), ConfigSource::Config);
                }
                if file_selection.max_context_files.is_some() {
                    selection.max_context_files = file_selection.max_context_files;
                    source_attribution
                        .insert("max_context_files".to_string(), ConfigSource::Config);
                }
                if file_selection.ignore_patterns.is_some() {
                    selection.ignore_patterns = file_selection.ignore_patterns;
                    source_attribution.insert("ignore_patterns".to_string(), ConfigSource::Config);
                }
                if !file_selection.extra_ignore_patterns.is_empty() {
                    selection.extra_ignore_patterns = file_selection.extra_ignore_patterns;
                    source_attribution
                        .insert("extra_ignore_patterns".to_string(), ConfigSource::Config);
                }
            }

            if let Some(file_llm) = file_config.llm {
                if file_llm.default_provider.is_some() {
                    llm.default_provider = file_llm.default_provider;
                    source_attribution.insert("default_provider".to_string(), ConfigSource::Config);
                }
                if file_llm.default_model.is_some() {
                    llm.default_model = file_llm.default_model;
                    source_attribution.insert("default_model".to_string(), ConfigSource::Config);
                }
                if file_llm.timeout_secs.is_some() {
                    llm.timeout_secs = file_llm.timeout_secs;
                    source_attribution.insert("timeout_secs".to_string(), ConfigSource::Config);
                }
                if file_llm.anythingllm.is_some() {
                    llm.anythingllm = file_llm.anythingllm;
                    source_attribution.insert("anythingllm".to_string(), ConfigSource::Config);
                }
            }
        }

        // CLI overrides (highest priority)
        if let Some(project_root) = &cli_args.project_root {
            selection.project_root = Some(project_root.clone());
            source_attribution.insert("project_root".to_string(), ConfigSource::Cli);
        }
        if let Some(max) = cli_args.max_context_files {
            selection.max_context_files = Some(max);
            source_attribution.insert("max_context_files".to_string(), ConfigSource::Cli);
        }
        if let Some(provider) = &cli_args.provider {
            llm.default_provider = Some(provider.clone());
            source_attribution.insert("default_provider".to_string(), ConfigSource::Cli);
        }
        if let Some(model) = &cli_args.model {
            llm.default_model = Some(model.clone());
            source_attribution.insert("default_model".to_string(), ConfigSource::Cli);
        }
        if let Some(timeout) = cli_args.timeout_secs {
            llm.timeout_secs = Some(timeout);
            source_attribution.insert("timeout_secs".to_string(), ConfigSource::Cli);
        }

        let config = Self {
            selection,
            llm,
            source_attribution,
        };

        config.validate()?;

        Ok(config)
    }

    /// Discover the config file by searching upward from `start_dir`.
    ///
    /// Looks for `.ctxbuf/config.toml`, stopping at repository root markers
    /// (`.git`, `.hg`, `.svn`) or the filesystem root.
    pub fn discover_config_file_from(start_dir: &Path) -> Result<Option<PathBuf>> {
        let mut current_dir = start_dir.to_path_buf();

        loop {
            let config_path = current_dir.join(CONFIG_DIR).join(CONFIG_FILE);
            if config_path.exists() {
                return Ok(Some(config_path));
            }

            if current_dir.join(".git").exists()
                || current_dir.join(".hg").exists()
                || current_dir.join(".svn").exists()
            {
                break;
            }

            match current_dir.parent() {
                Some(parent) => current_dir = parent.to_path_buf(),
                None => break,
            }
        }

        Ok(None)
    }

    /// User-level config file, if one exists.
    fn user_config_file() -> Option<PathBuf> {
        let path = dirs::config_dir()?.join("ctxbuf").join(CONFIG_FILE);
        path.exists().then_some(path)
    }

    /// Load configuration from a TOML file. A missing file yields defaults.
    fn load_config_file(path: &Path) -> Result<TomlConfig> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let config: TomlConfig = toml::from_str(&content).with_context(|| {
                    format!("Failed to parse TOML config file: {}", path.display())
                })?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(TomlConfig::default()),
            Err(e) => Err(anyhow::anyhow!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            )),
        }
    }
}
