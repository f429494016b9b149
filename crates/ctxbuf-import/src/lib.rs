//! Folder import for ctxbuf
//!
//! Reads an uploaded folder, runs the auto-fix and command-detection hooks,
//! and assembles the chat messages that bring the project into a session.

mod assemble;
mod autofix;
mod commands;
mod source;

pub use assemble::{create_chat_from_folder, escape_bolt_tags, message_id};
pub use autofix::{AutoFixResult, AutoFixer, FileFix, NoopAutoFixer, apply_fixes, create_auto_fix_message};
pub use commands::{CommandDetector, DefaultCommandDetector, ProjectCommands, create_commands_message};
pub use source::{
    FileArtifact, FolderScan, LocalFile, UploadedFile, artifact_path, load_file_map, read_artifacts,
    scan_folder,
};
