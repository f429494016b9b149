//! Static HTML site detection and its short-circuit file set.
//!
//! Static templates ship large bundled libraries that would exhaust the
//! context budget, so for those projects the selector skips the model call
//! and returns page sources only.

use once_cell::sync::Lazy;
use regex::Regex;

use ctxbuf_utils::types::{ContextFiles, FileMap, relative_path};

use crate::filter::FileFilter;

static MARKUP_FILE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\.(html|css|scss|less)$").unwrap());
static JS_FILE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\.js$").unwrap());
static CONFIG_FILE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\.(json|md)$").unwrap());

const EXCLUDED_SEGMENTS: &[&str] = &["/libraries/", "/fonts/", "node_modules/"];

/// Whether the path set looks like a static HTML site.
///
/// True when some path contains `index.html` and either some path has a
/// `/libraries/` segment or there are both CSS and JS paths.
#[must_use]
pub fn is_static_html_project(files: &FileMap) -> bool {
    let paths = || files.keys().map(String::as_str);

    let has_index_html = paths().any(|p| p.contains("index.html"));
    if !has_index_html {
        return false;
    }

    let has_libraries = paths().any(|p| p.contains("/libraries/"));
    let has_css = paths().any(|p| p.contains("/css/") || p.ends_with(".css"));
    let has_js = paths().any(|p| p.contains("/js/") || p.ends_with(".js"));

    has_libraries || (has_css && has_js)
}

/// The short-circuit selection for a static HTML project.
///
/// Keeps markup and stylesheets, scripts under a top-level `js/`, and
/// JSON/Markdown files. Library, font, dependency, ignored, and binary files
/// are dropped. Keys are relative paths.
#[must_use]
pub fn static_html_context(files: &FileMap, filter: &FileFilter) -> ContextFiles {
    files
        .iter()
        .filter(|(path, record)| !record.is_binary && !filter.is_ignored(path))
        .filter_map(|(path, record)| {
            let relative = relative_path(path, filter.project_root());
            let rooted = format!("/{relative}");
            if EXCLUDED_SEGMENTS.iter().any(|s| rooted.contains(s)) {
                return None;
            }

            let keep = MARKUP_FILE.is_match(relative)
                || (JS_FILE.is_match(relative) && relative.starts_with("js/"))
                || CONFIG_FILE.is_match(relative);
            keep.then(|| (relative.to_string(), record.clone()))
        })
        .collect()
}
