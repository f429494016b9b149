//! Builders shared by unit and integration tests.

use crate::chat::{Annotation, ChatMessage};
use crate::types::{FileMap, FileRecord, PROJECT_ROOT};

/// Build a [`FileMap`] from `(relative_path, content)` pairs.
pub fn file_map<'a>(files: impl IntoIterator<Item = (&'a str, &'a str)>) -> FileMap {
    files
        .into_iter()
        .map(|(path, content)| (format!("{PROJECT_ROOT}{path}"), FileRecord::text(content)))
        .collect()
}

/// Build a [`FileMap`] of text files with placeholder content.
pub fn file_map_of(paths: &[&str]) -> FileMap {
    file_map(paths.iter().map(|p| (*p, "// content")))
}

/// Assistant message carrying a `codeContext` annotation.
pub fn assistant_with_context(text: &str, files: &[&str]) -> ChatMessage {
    ChatMessage::assistant(text).with_annotation(Annotation::code_context(
        files.iter().map(|f| (*f).to_string()).collect(),
    ))
}

/// Wrap `body` in the response wrapper the selector expects.
pub fn buffer_update(body: &str) -> String {
    format!("<updateContextBuffer>\n{body}\n</updateContextBuffer>")
}
