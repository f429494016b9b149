use std::collections::HashMap;

use ctxbuf_utils::types::ConfigSource;

use crate::model::Config;

fn source_label(source: Option<&ConfigSource>) -> String {
    source.copied().unwrap_or(ConfigSource::Default).to_string()
}

impl Config {
    /// Effective configuration as `key -> (value, source)` pairs.
    #[must_use]
    pub fn effective_config(&self) -> HashMap<String, (String, String)> {
        let mut config = HashMap::new();

        let mut add_config = |key: &str, value: String| {
            let source = source_label(self.source_attribution.get(key));
            config.insert(key.to_string(), (value, source));
        };

        add_config("project_root", self.project_root().to_string());
        add_config("max_context_files", self.max_context_files().to_string());
        add_config("ignore_patterns", self.ignore_rules().effective_patterns().join(", "));
        add_config("default_provider", self.default_provider().to_string());
        add_config("default_model", self.default_model().to_string());
        add_config("timeout_secs", self.timeout().as_secs().to_string());

        let anythingllm = self.anythingllm();
        let source = source_label(self.source_attribution.get("anythingllm"));
        config.insert(
            "anythingllm_base_url".to_string(),
            (anythingllm.base_url, source.clone()),
        );
        config.insert(
            "anythingllm_api_key_env".to_string(),
            (anythingllm.api_key_env, source),
        );

        config
    }
}
