use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

use ctxbuf_utils::error::ConfigError;

/// Canonical ignore patterns applied to every project file list.
///
/// Patterns use gitignore conventions and are matched against paths relative
/// to the project root:
///
/// - dependency and build output directories (`node_modules`, `dist`, `build`, `.next`, `coverage`, `.cache`)
/// - VCS and editor state (`.git`, `.vscode`, `.idea`)
/// - logs, OS metadata, and lock files
pub const IGNORE_PATTERNS: &[&str] = &[
    "node_modules/**",
    ".git/**",
    "dist/**",
    "build/**",
    ".next/**",
    "coverage/**",
    ".cache/**",
    ".vscode/**",
    ".idea/**",
    "**/*.log",
    "**/.DS_Store",
    "**/npm-debug.log*",
    "**/yarn-debug.log*",
    "**/yarn-error.log*",
    "**/*lock.json",
    "**/*lock.yaml",
];

/// Ignore-pattern configuration.
///
/// `patterns` replaces the canonical list when set; `extra` is appended to
/// whichever list is in effect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoreRules {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patterns: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<String>,
}

impl IgnoreRules {
    /// The pattern list these rules resolve to.
    #[must_use]
    pub fn effective_patterns(&self) -> Vec<String> {
        let mut patterns = match &self.patterns {
            Some(patterns) => patterns.clone(),
            None => IGNORE_PATTERNS.iter().map(|s| (*s).to_string()).collect(),
        };
        patterns.extend(self.extra.iter().cloned());
        patterns
    }

    /// Validate every glob pattern.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let check = |key: &str, patterns: &[String]| -> Result<(), ConfigError> {
            for pattern in patterns {
                for glob in translate_pattern(pattern) {
                    compile_glob(&glob).map_err(|e| ConfigError::InvalidValue {
                        key: key.to_string(),
                        value: format!("Invalid glob pattern '{pattern}': {e}"),
                    })?;
                }
            }
            Ok(())
        };

        if let Some(patterns) = &self.patterns {
            check("selection.ignore_patterns", patterns)?;
        }
        check("selection.extra_ignore_patterns", &self.extra)
    }
}

/// Compiled, immutable ignore matcher.
///
/// Built once and shared by reference; matching never mutates it.
#[derive(Debug, Clone)]
pub struct IgnoreMatcher {
    set: GlobSet,
    patterns: Vec<String>,
}

impl IgnoreMatcher {
    /// Compile a matcher from gitignore-style patterns. Matching ignores case.
    pub fn new<I, S>(patterns: I) -> Result<Self, globset::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GlobSetBuilder::new();
        let mut kept = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            for glob in translate_pattern(pattern) {
                builder.add(compile_glob(&glob)?);
            }
            kept.push(pattern.to_string());
        }

        Ok(Self {
            set: builder.build()?,
            patterns: kept,
        })
    }

    /// Matcher over [`IGNORE_PATTERNS`].
    pub fn canonical() -> Result<Self, globset::Error> {
        Self::new(IGNORE_PATTERNS)
    }

    pub fn from_rules(rules: &IgnoreRules) -> Result<Self, globset::Error> {
        Self::new(rules.effective_patterns())
    }

    /// Whether `path` (relative to the project root) is ignored.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        let path = path.trim_start_matches('/');
        !path.is_empty() && self.set.is_match(path)
    }

    /// Source patterns, as given.
    #[must_use]
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

fn compile_glob(glob: &str) -> Result<globset::Glob, globset::Error> {
    GlobBuilder::new(glob)
        .literal_separator(true)
        .case_insensitive(true)
        .build()
}

/// Translate one gitignore-style pattern into equivalent globs.
///
/// A pattern without an inner `/` matches at any depth, a trailing `/`
/// matches directory contents, and a bare name also matches everything
/// beneath a directory of that name.
fn translate_pattern(pattern: &str) -> Vec<String> {
    let trimmed = pattern.trim();
    let (dir_only, body) = match trimmed.strip_suffix('/') {
        Some(body) => (true, body),
        None => (false, trimmed),
    };
    let anchored = body.starts_with('/') || body.contains('/');
    let body = body.trim_start_matches('/');

    let base = if anchored || body.starts_with("**") {
        body.to_string()
    } else {
        format!("**/{body}")
    };

    if dir_only {
        vec![format!("{base}/**")]
    } else if base.ends_with("/**") {
        vec![base]
    } else {
        vec![base.clone(), format!("{base}/**")]
    }
}
