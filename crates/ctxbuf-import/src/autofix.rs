//! Auto-fix hook run on imported files before command detection.

use ctxbuf_utils::chat::ChatMessage;

use crate::assemble::message_id;
use crate::source::FileArtifact;

/// Replacement content for one imported file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFix {
    pub path: String,
    pub content: String,
    pub description: String,
}

/// Fixes to apply plus optional command overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutoFixResult {
    pub fixes: Vec<FileFix>,
    pub setup_command: Option<String>,
    pub start_command: Option<String>,
}

/// Inspects imported files and proposes fixes.
pub trait AutoFixer {
    fn fix(&self, files: &[FileArtifact]) -> AutoFixResult;
}

/// Fixer that never changes anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAutoFixer;

impl AutoFixer for NoopAutoFixer {
    fn fix(&self, _files: &[FileArtifact]) -> AutoFixResult {
        AutoFixResult::default()
    }
}

/// Replace the content of every file that has a fix.
#[must_use]
pub fn apply_fixes(files: Vec<FileArtifact>, result: &AutoFixResult) -> Vec<FileArtifact> {
    files
        .into_iter()
        .map(|file| match result.fixes.iter().find(|f| f.path == file.path) {
            Some(fix) => FileArtifact {
                content: fix.content.clone(),
                ..file
            },
            None => file,
        })
        .collect()
}

/// Assistant message reporting applied fixes, or `None` when there are none.
#[must_use]
pub fn create_auto_fix_message(result: &AutoFixResult) -> Option<ChatMessage> {
    if result.fixes.is_empty() {
        return None;
    }

    let count = result.fixes.len();
    let plural = if count == 1 { "" } else { "s" };
    let lines: Vec<String> = result
        .fixes
        .iter()
        .map(|f| format!("- `{}`: {}", f.path, f.description))
        .collect();

    Some(
        ChatMessage::assistant(format!(
            "I've automatically fixed {count} issue{plural} in the imported project:\n\n{}",
            lines.join("\n")
        ))
        .with_id(message_id("auto-fix"))
        .with_created_at(chrono::Utc::now()),
    )
}
