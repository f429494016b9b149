//! Shared data model: project file maps and the context buffer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Prefix under which every project file lives in a [`FileMap`].
pub const PROJECT_ROOT: &str = "/home/project/";

/// Default soft cap on the number of files held in the context buffer.
pub const DEFAULT_MAX_CONTEXT_FILES: usize = 5;

/// A single file as seen by the selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub content: String,
    #[serde(default)]
    pub is_binary: bool,
}

impl FileRecord {
    /// Create a text file record.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_binary: false,
        }
    }

    /// Create a binary file record. Binary records carry no usable content.
    #[must_use]
    pub fn binary() -> Self {
        Self {
            content: String::new(),
            is_binary: true,
        }
    }
}

/// Absolute project path (e.g. `/home/project/src/main.ts`) to file record.
///
/// A `BTreeMap` keeps iteration deterministic so prompts and rendered
/// context blocks are stable between runs.
pub type FileMap = BTreeMap<String, FileRecord>;

/// Relative project path (e.g. `src/main.ts`) to file record. This is the
/// shape of the context buffer and of every selection result.
pub type ContextFiles = BTreeMap<String, FileRecord>;

/// Strip `root` from `path` if present, otherwise return `path` unchanged.
#[must_use]
pub fn relative_path<'a>(path: &'a str, root: &str) -> &'a str {
    path.strip_prefix(root).unwrap_or(path)
}

/// Prefix `path` with `root` unless it already carries it.
#[must_use]
pub fn absolute_path(path: &str, root: &str) -> String {
    if path.starts_with(root) {
        path.to_string()
    } else {
        format!("{root}{path}")
    }
}

/// Where a configuration value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    /// Value provided via CLI argument (highest precedence).
    Cli,
    /// Value loaded from configuration file.
    Config,
    /// Value provided programmatically (e.g., `Config::builder()`).
    Programmatic,
    /// Built-in default value (lowest precedence).
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "cli"),
            Self::Config => write!(f, "config"),
            Self::Programmatic => write!(f, "programmatic"),
            Self::Default => write!(f, "default"),
        }
    }
}
