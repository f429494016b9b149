//! The context selector: one model round trip per call.

use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{Instrument, debug, info};

use ctxbuf_config::Config;
use ctxbuf_llm::{
    Credentials, LlmInvocation, LlmResult, Message, ModelResolution, ProviderRegistry,
    resolve_model,
};
use ctxbuf_selectors::IgnoreMatcher;
use ctxbuf_utils::chat::ChatMessage;
use ctxbuf_utils::error::{ConfigError, SelectError};
use ctxbuf_utils::logging::{log_selection_complete, log_selection_error, selection_span};
use ctxbuf_utils::types::{ContextFiles, DEFAULT_MAX_CONTEXT_FILES, FileMap};

use crate::classify::{is_static_html_project, static_html_context};
use crate::context::extract_current_context;
use crate::filter::{FileFilter, FilteredPaths};
use crate::preprocess::{ProcessedMessages, preprocess_messages};
use crate::prompt::build_prompt;
use crate::reconcile::Reconciler;
use crate::response::parse_response;

/// Observer called with the raw model response after a successful selection.
pub type OnFinish = Box<dyn FnOnce(&LlmResult) + Send>;

/// Fixed settings of a [`ContextSelector`].
///
/// The project root is owned by the [`FileFilter`] so candidate listing and
/// include normalization always agree.
#[derive(Debug, Clone)]
pub struct SelectorOptions {
    pub max_context_files: usize,
    pub default_provider: String,
    pub default_model: String,
    pub timeout: Duration,
}

impl Default for SelectorOptions {
    fn default() -> Self {
        Self {
            max_context_files: DEFAULT_MAX_CONTEXT_FILES,
            default_provider: ctxbuf_config::DEFAULT_PROVIDER.to_string(),
            default_model: ctxbuf_config::DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(ctxbuf_config::DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl SelectorOptions {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_context_files: config.max_context_files(),
            default_provider: config.default_provider().to_string(),
            default_model: config.default_model().to_string(),
            timeout: config.timeout(),
        }
    }
}

/// One selection call.
pub struct SelectionRequest {
    pub messages: Vec<ChatMessage>,
    pub files: FileMap,
    /// Running chat summary. When empty, the latest `chatSummary`
    /// annotation is used instead.
    pub summary: String,
    pub credentials: Credentials,
    pub on_finish: Option<OnFinish>,
}

impl SelectionRequest {
    #[must_use]
    pub fn new(messages: Vec<ChatMessage>, files: FileMap) -> Self {
        Self {
            messages,
            files,
            summary: String::new(),
            credentials: Credentials::default(),
            on_finish: None,
        }
    }

    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    #[must_use]
    pub fn on_finish(mut self, observer: impl FnOnce(&LlmResult) + Send + 'static) -> Self {
        self.on_finish = Some(Box::new(observer));
        self
    }
}

/// How a selection was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectionOutcome {
    /// Static HTML project; no model call was made.
    StaticHtml,
    /// New files were staged from the model's includes.
    Updated {
        model: String,
        fallback: bool,
        rejected: Vec<String>,
    },
    /// The model requested no change; the current buffer is returned.
    Unchanged { model: String },
}

impl SelectionOutcome {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StaticHtml => "static_html",
            Self::Updated { .. } => "updated",
            Self::Unchanged { .. } => "unchanged",
        }
    }
}

/// Selected files keyed by relative path, with how they were chosen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    pub files: ContextFiles,
    pub outcome: SelectionOutcome,
}

/// Chooses the files to place in the context buffer for the next turn.
pub struct ContextSelector {
    filter: FileFilter,
    registry: Arc<ProviderRegistry>,
    options: SelectorOptions,
}

impl ContextSelector {
    #[must_use]
    pub fn new(filter: FileFilter, registry: Arc<ProviderRegistry>, options: SelectorOptions) -> Self {
        Self {
            filter,
            registry,
            options,
        }
    }

    /// Build a selector whose ignore rules and options come from `config`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` when an ignore pattern does not compile.
    pub fn from_config(
        config: &Config,
        registry: Arc<ProviderRegistry>,
    ) -> Result<Self, ConfigError> {
        let matcher = IgnoreMatcher::from_rules(&config.ignore_rules()).map_err(|e| {
            ConfigError::InvalidValue {
                key: "selection.ignore_patterns".to_string(),
                value: e.to_string(),
            }
        })?;
        let filter = FileFilter::new(matcher, config.project_root());
        Ok(Self::new(filter, registry, SelectorOptions::from_config(config)))
    }

    #[must_use]
    pub fn filter(&self) -> &FileFilter {
        &self.filter
    }

    #[must_use]
    pub fn options(&self) -> &SelectorOptions {
        &self.options
    }

    /// Select the context files for the latest user turn.
    ///
    /// # Errors
    ///
    /// Returns `SelectError` when the history has no user turn, the provider
    /// has no models, the invocation fails, the response is malformed, or no
    /// file could be selected.
    pub async fn select(&self, request: SelectionRequest) -> Result<Selection, SelectError> {
        let started = Instant::now();

        if is_static_html_project(&request.files) {
            let files = static_html_context(&request.files, &self.filter);
            info!(
                "Returning {} files for static HTML context (excluded libraries/fonts)",
                files.len()
            );
            log_selection_complete(files.len(), "static_html", started.elapsed().as_millis());
            return Ok(Selection {
                files,
                outcome: SelectionOutcome::StaticHtml,
            });
        }

        let processed = preprocess_messages(
            &request.messages,
            &self.options.default_model,
            &self.options.default_provider,
        );
        let candidates = self.filter.filter(&request.files);
        let span = selection_span(&processed.provider, &processed.model, candidates.len());

        let result = self
            .select_with_model(request, processed, candidates)
            .instrument(span)
            .await;

        let elapsed = started.elapsed().as_millis();
        match &result {
            Ok(selection) => {
                log_selection_complete(selection.files.len(), selection.outcome.as_str(), elapsed);
            }
            Err(e) => log_selection_error(&e.to_string(), elapsed),
        }
        result
    }

    async fn select_with_model(
        &self,
        request: SelectionRequest,
        processed: ProcessedMessages,
        candidates: FilteredPaths,
    ) -> Result<Selection, SelectError> {
        let SelectionRequest {
            files,
            summary,
            credentials,
            on_finish,
            ..
        } = request;

        let current = extract_current_context(&processed.messages, &files, &self.filter);
        let summary = if summary.is_empty() {
            current.summary.clone().unwrap_or_default()
        } else {
            summary
        };

        let prompt = build_prompt(
            &processed.messages,
            &candidates,
            &current.rendered,
            &summary,
            self.options.max_context_files,
        )?;

        let provider = self.registry.resolve(&processed.provider);
        let resolution = resolve_model(provider.as_ref(), &processed.model, &credentials).await?;
        let fallback = resolution.is_fallback();
        let model = match resolution {
            ModelResolution::Found(model) | ModelResolution::Fallback { model, .. } => model,
            ModelResolution::Unavailable { provider } => {
                return Err(SelectError::NoModelsAvailable { provider });
            }
        };

        let backend = provider.backend(&model.name, &credentials)?;
        let invocation = LlmInvocation::new(
            model.name.clone(),
            self.options.timeout,
            vec![Message::system(prompt.system), Message::user(prompt.user)],
        );
        let response = backend.invoke(invocation).await?;
        debug!(
            model = %response.model_used,
            tokens_output = ?response.tokens_output,
            "Received context buffer update"
        );

        let update = parse_response(&response.raw_response)?;
        let reconciliation = Reconciler {
            files: &files,
            candidates: &candidates,
            project_root: self.filter.project_root(),
            max_context_files: self.options.max_context_files,
        }
        .reconcile(&update, &current)?;

        info!("Total files: {}", reconciliation.files.len());

        if let Some(observer) = on_finish {
            observer(&response);
        }

        let outcome = if reconciliation.unchanged {
            SelectionOutcome::Unchanged { model: model.name }
        } else {
            SelectionOutcome::Updated {
                model: model.name,
                fallback,
                rejected: reconciliation.rejected,
            }
        };

        Ok(Selection {
            files: reconciliation.files,
            outcome,
        })
    }
}
