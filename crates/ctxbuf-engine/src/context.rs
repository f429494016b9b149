use ctxbuf_utils::chat::{Annotation, ChatMessage, KnownAnnotation};
use ctxbuf_utils::types::{ContextFiles, FileMap, relative_path};

use crate::filter::FileFilter;
use crate::markup::render_files_context;

/// The context buffer as declared by the latest `codeContext` annotation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrentContext {
    /// Buffered files keyed by relative path.
    pub files: ContextFiles,
    /// Relative paths of the buffered files, in map order.
    pub current_paths: Vec<String>,
    /// Rendered artifact for the prompt; empty when no directive was found.
    pub rendered: String,
    /// Latest chat summary annotation, if any.
    pub summary: Option<String>,
}

impl CurrentContext {
    #[must_use]
    pub fn contains(&self, relative: &str) -> bool {
        self.files.contains_key(relative)
    }
}

/// Find the latest declared context buffer and resolve it against `files`.
///
/// Declared paths that are missing from `files` or ignored by `filter` are
/// dropped.
#[must_use]
pub fn extract_current_context(
    messages: &[ChatMessage],
    files: &FileMap,
    filter: &FileFilter,
) -> CurrentContext {
    let summary = messages.iter().rev().find_map(|m| {
        m.annotations.iter().rev().find_map(|a| match a {
            Annotation::Known(KnownAnnotation::ChatSummary(s)) => Some(s.summary.clone()),
            _ => None,
        })
    });

    let Some(declared) = messages.iter().rev().find_map(ChatMessage::code_context) else {
        return CurrentContext {
            summary,
            ..CurrentContext::default()
        };
    };

    let context_files: ContextFiles = files
        .iter()
        .filter(|(path, _)| !filter.is_ignored(path))
        .filter_map(|(path, record)| {
            let relative = relative_path(path, filter.project_root());
            declared
                .files
                .iter()
                .any(|f| f == relative)
                .then(|| (relative.to_string(), record.clone()))
        })
        .collect();

    CurrentContext {
        current_paths: context_files.keys().cloned().collect(),
        rendered: render_files_context(&context_files),
        files: context_files,
        summary,
    }
}
