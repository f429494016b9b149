//! Turn an uploaded folder into the chat messages that import it.

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

use ctxbuf_utils::chat::ChatMessage;
use ctxbuf_utils::error::ImportError;
use ctxbuf_utils::logging::import_span;

use crate::autofix::{AutoFixer, apply_fixes, create_auto_fix_message};
use crate::commands::{CommandDetector, create_commands_message};
use crate::source::{FileArtifact, UploadedFile, read_artifacts};

static BOLT_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?bolt(?:Artifact|Action)[^>]*>").unwrap());

static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Short unique message id derived from `seed`, the clock, and a counter.
#[must_use]
pub fn message_id(seed: &str) -> String {
    let n = ID_COUNTER.fetch_add(1, Ordering::Relaxed);
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let hash = blake3::hash(format!("{seed}:{nanos}:{n}").as_bytes());
    hash.to_hex()[..16].to_string()
}

/// Escape bolt artifact and action tags so file content cannot close the
/// surrounding artifact.
#[must_use]
pub fn escape_bolt_tags(content: &str) -> String {
    BOLT_TAG
        .replace_all(content, |caps: &Captures<'_>| {
            caps[0].replace('<', "&lt;").replace('>', "&gt;")
        })
        .into_owned()
}

fn import_message(folder_name: &str, files: &[FileArtifact], binary_files: &[String]) -> String {
    let skipped = if binary_files.is_empty() {
        String::new()
    } else {
        let list: Vec<String> = binary_files.iter().map(|f| format!("- {f}")).collect();
        format!(
            "\n\nSkipped {} binary files:\n{}",
            binary_files.len(),
            list.join("\n")
        )
    };

    let actions: Vec<String> = files
        .iter()
        .map(|f| {
            format!(
                "<boltAction type=\"file\" filePath=\"{}\">\n{}\n</boltAction>",
                f.path,
                escape_bolt_tags(&f.content)
            )
        })
        .collect();

    format!(
        "I've imported the contents of the \"{folder_name}\" folder.{skipped}\n\n\
         <boltArtifact id=\"imported-files\" title=\"Imported Files\" type=\"bundled\" >\n\
         {}\n\
         </boltArtifact>",
        actions.join("\n\n")
    )
}

/// Build the import conversation for an uploaded folder.
///
/// Messages, in order: the user's import request, the assistant message
/// carrying every file, the auto-fix report when fixes were applied, and a
/// setup request with its command message when commands were detected.
///
/// # Errors
///
/// Returns `ImportError::EmptyFolder` when there are no text files, or
/// `ImportError::ReadFailed` when a file cannot be read.
pub fn create_chat_from_folder<F: UploadedFile>(
    files: &[F],
    binary_files: &[String],
    folder_name: &str,
    fixer: &dyn AutoFixer,
    detector: &dyn CommandDetector,
) -> Result<Vec<ChatMessage>, ImportError> {
    let span = import_span(folder_name, files.len());
    let _guard = span.enter();

    if files.is_empty() {
        return Err(ImportError::EmptyFolder {
            folder: folder_name.to_string(),
        });
    }

    let artifacts = read_artifacts(files)?;
    let fix_result = fixer.fix(&artifacts);
    let artifacts = apply_fixes(artifacts, &fix_result);

    let mut commands = detector.detect(&artifacts);
    if commands.setup_command.is_some() && fix_result.setup_command.is_some() {
        commands.setup_command.clone_from(&fix_result.setup_command);
    }
    if fix_result.start_command.is_some() {
        commands.start_command.clone_from(&fix_result.start_command);
    }

    let now = Utc::now();
    let mut messages = vec![
        ChatMessage::user(format!("Import the \"{folder_name}\" folder"))
            .with_id(message_id(folder_name))
            .with_created_at(now),
        ChatMessage::assistant(import_message(folder_name, &artifacts, binary_files))
            .with_id(message_id(folder_name))
            .with_created_at(now),
    ];

    if let Some(message) = create_auto_fix_message(&fix_result) {
        messages.push(message);
    }

    if let Some(message) = create_commands_message(&commands) {
        messages.push(
            ChatMessage::user("Setup the codebase and start the application automatically")
                .with_id(message_id(folder_name)),
        );
        messages.push(message);
    }

    info!(
        files = artifacts.len(),
        binary_files = binary_files.len(),
        fixes = fix_result.fixes.len(),
        messages = messages.len(),
        "Folder import assembled"
    );
    Ok(messages)
}
