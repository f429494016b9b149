use std::collections::HashSet;
use std::sync::Arc;

use ctxbuf_selectors::IgnoreMatcher;
use ctxbuf_utils::types::{FileMap, relative_path};

/// Applies the ignore matcher to project paths.
///
/// Matching happens on the path relative to `project_root`; results keep the
/// full project path so they can be listed in prompts and checked against
/// model proposals without re-prefixing.
#[derive(Debug, Clone)]
pub struct FileFilter {
    matcher: Arc<IgnoreMatcher>,
    project_root: String,
}

impl FileFilter {
    #[must_use]
    pub fn new(matcher: IgnoreMatcher, project_root: impl Into<String>) -> Self {
        Self::shared(Arc::new(matcher), project_root)
    }

    /// Share one compiled matcher between filters.
    #[must_use]
    pub fn shared(matcher: Arc<IgnoreMatcher>, project_root: impl Into<String>) -> Self {
        Self {
            matcher,
            project_root: project_root.into(),
        }
    }

    #[must_use]
    pub fn project_root(&self) -> &str {
        &self.project_root
    }

    /// Whether `path` (full or relative) is ignored.
    #[must_use]
    pub fn is_ignored(&self, path: &str) -> bool {
        self.matcher.matches(relative_path(path, &self.project_root))
    }

    /// Non-ignored paths of `files`, in map order.
    #[must_use]
    pub fn filter(&self, files: &FileMap) -> FilteredPaths {
        self.filter_paths(files.keys().map(String::as_str))
    }

    /// Non-ignored entries of `paths`, order preserved.
    #[must_use]
    pub fn filter_paths<'a>(&self, paths: impl IntoIterator<Item = &'a str>) -> FilteredPaths {
        let paths: Vec<String> = paths
            .into_iter()
            .filter(|p| !self.is_ignored(p))
            .map(str::to_string)
            .collect();
        FilteredPaths::new(paths, self.project_root.clone())
    }
}

/// Ordered, de-duplicated-on-lookup list of candidate paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredPaths {
    paths: Vec<String>,
    index: HashSet<String>,
    project_root: String,
}

impl FilteredPaths {
    fn new(paths: Vec<String>, project_root: String) -> Self {
        let index = paths.iter().cloned().collect();
        Self {
            paths,
            index,
            project_root,
        }
    }

    #[must_use]
    pub fn contains(&self, full_path: &str) -> bool {
        self.index.contains(full_path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    /// Paths with the project root removed.
    pub fn relative(&self) -> impl Iterator<Item = &str> {
        self.paths
            .iter()
            .map(|p| relative_path(p, &self.project_root))
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctxbuf_utils::test_support::file_map_of;
    use ctxbuf_utils::types::PROJECT_ROOT;

    fn canonical() -> FileFilter {
        FileFilter::new(IgnoreMatcher::canonical().unwrap(), PROJECT_ROOT)
    }

    #[test]
    fn test_filter_drops_ignored_paths_and_keeps_full_form() {
        let files = file_map_of(&[
            "src/app.ts",
            "node_modules/react/index.js",
            "package-lock.json",
            "package.json",
            "debug.log",
        ]);

        let filtered = canonical().filter(&files);

        assert_eq!(
            filtered.as_slice(),
            &[
                "/home/project/package.json".to_string(),
                "/home/project/src/app.ts".to_string(),
            ]
        );
        assert!(filtered.contains("/home/project/src/app.ts"));
        assert!(!filtered.contains("src/app.ts"));
        assert_eq!(
            filtered.relative().collect::<Vec<_>>(),
            vec!["package.json", "src/app.ts"]
        );
    }

    #[test]
    fn test_is_ignored_accepts_relative_and_full_paths() {
        let filter = canonical();
        assert!(filter.is_ignored("/home/project/dist/main.js"));
        assert!(filter.is_ignored("dist/main.js"));
        assert!(!filter.is_ignored("/home/project/src/dist.ts"));
    }

    proptest::proptest! {
        #[test]
        fn prop_filter_is_idempotent(
            names in proptest::collection::vec(
                "(src|dist|node_modules|docs|\\.git)/[a-z]{1,6}\\.(ts|js|log|json|md)",
                0..20,
            )
        ) {
            let filter = canonical();
            let full: Vec<String> = names.iter().map(|n| format!("{PROJECT_ROOT}{n}")).collect();

            let once = filter.filter_paths(full.iter().map(String::as_str));
            let twice = filter.filter_paths(once.iter());

            proptest::prop_assert_eq!(once.as_slice(), twice.as_slice());
        }
    }
}
