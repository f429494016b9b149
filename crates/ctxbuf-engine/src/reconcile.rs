//! Apply a parsed buffer update to the current context buffer.

use std::collections::HashSet;
use tracing::{debug, error, warn};

use ctxbuf_utils::error::SelectError;
use ctxbuf_utils::types::{ContextFiles, FileMap, absolute_path, relative_path};

use crate::context::CurrentContext;
use crate::filter::FilteredPaths;
use crate::response::BufferUpdate;

/// Result of reconciling one buffer update.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// Newly staged files keyed by relative path, or the current buffer when
    /// `unchanged` is set.
    pub files: ContextFiles,
    /// Included paths that were not among the candidate paths.
    pub rejected: Vec<String>,
    /// The model asked for no change and the current buffer was kept.
    pub unchanged: bool,
}

/// Inputs that stay fixed for one reconciliation.
pub struct Reconciler<'a> {
    pub files: &'a FileMap,
    pub candidates: &'a FilteredPaths,
    pub project_root: &'a str,
    pub max_context_files: usize,
}

impl Reconciler<'_> {
    /// Apply excludes, then stage includes.
    ///
    /// Includes are staged only when they are candidates, not already
    /// buffered, not excluded by the same update, and within the file cap.
    /// Rejected paths are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns `SelectError::NoFilesSelected` when nothing was staged, unless
    /// the update was empty and a current buffer exists.
    pub fn reconcile(
        &self,
        update: &BufferUpdate,
        current: &CurrentContext,
    ) -> Result<Reconciliation, SelectError> {
        let excluded: HashSet<&str> = update
            .excludes
            .iter()
            .map(|p| relative_path(p, self.project_root))
            .collect();

        let remaining = current
            .files
            .keys()
            .filter(|k| !excluded.contains(k.as_str()))
            .count();
        debug!(
            excluded = excluded.len(),
            remaining, "Applied context buffer excludes"
        );

        let mut staged = ContextFiles::new();
        let mut rejected = Vec::new();

        for path in &update.includes {
            let full = absolute_path(path, self.project_root);
            let relative = relative_path(&full, self.project_root);

            if excluded.contains(relative) {
                warn!(path = %relative, "File both included and excluded, keeping it excluded");
                continue;
            }
            if !self.candidates.contains(&full) {
                let err = SelectError::InvalidFileReference {
                    path: path.clone(),
                };
                error!("{err}");
                rejected.push(path.clone());
                continue;
            }
            if current.current_paths.iter().any(|p| p == relative) || staged.contains_key(relative) {
                continue;
            }
            if staged.len() >= self.max_context_files {
                warn!(
                    path = %relative,
                    max_context_files = self.max_context_files,
                    "Context buffer is full, dropping include"
                );
                continue;
            }
            if let Some(record) = self.files.get(&full) {
                staged.insert(relative.to_string(), record.clone());
            }
        }

        if !staged.is_empty() {
            return Ok(Reconciliation {
                files: staged,
                rejected,
                unchanged: false,
            });
        }

        if update.is_empty() && !current.files.is_empty() {
            return Ok(Reconciliation {
                files: current.files.clone(),
                rejected,
                unchanged: true,
            });
        }

        Err(SelectError::NoFilesSelected)
    }
}
