use std::sync::LazyLock;

use regex::Regex;

/// Directory names that hold third-party code and are never scanned.
pub const DEPENDENCY_DIRS: &[&str] = &["node_modules", "bower_components", "vendor"];

static HIDDEN_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\.").expect("hidden segment regex"));

static SCRIPT_FILES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"\.tsx?$", r"\.jsx?$"]
        .iter()
        .map(|p| Regex::new(p).expect("script extension regex"))
        .collect()
});

/// A single pattern tested against one path segment (a directory or file name).
#[derive(Debug, Clone)]
pub enum PathPattern {
    /// Exact segment equality, e.g. `node_modules`.
    Name(String),
    /// Shell-style glob, e.g. `*.generated` (user-supplied exclusions).
    Glob(glob::Pattern),
    /// Regular expression, e.g. `^\.` for hidden entries.
    Regex(Regex),
}

impl PathPattern {
    pub fn matches(&self, segment: &str) -> bool {
        match self {
            Self::Name(name) => name == segment,
            Self::Glob(pattern) => pattern.matches(segment),
            Self::Regex(re) => re.is_match(segment),
        }
    }
}

/// Returns true if any pattern matches `segment`.
pub fn matches_any(segment: &str, patterns: &[PathPattern]) -> bool {
    patterns.iter().any(|p| p.matches(segment))
}

/// Exclusion and inclusion rules for a walk.
///
/// Exclusions apply to every entry (directories are pruned, files dropped).
/// Inclusions apply to files only; they never stop descent into a directory.
#[derive(Debug, Clone, Default)]
pub struct WalkFilter {
    exclude: Vec<PathPattern>,
    include: Vec<Regex>,
}

impl WalkFilter {
    pub fn new(exclude: Vec<PathPattern>, include: Vec<Regex>) -> Self {
        Self { exclude, include }
    }

    /// Skip dependency and hidden directories; keep `.ts`, `.tsx`, `.js`, `.jsx` files.
    pub fn project_default() -> Self {
        let mut exclude: Vec<PathPattern> = DEPENDENCY_DIRS
            .iter()
            .map(|name| PathPattern::Name((*name).to_owned()))
            .collect();
        exclude.push(PathPattern::Regex(HIDDEN_SEGMENT.clone()));

        Self::new(exclude, SCRIPT_FILES.clone())
    }

    /// Append glob exclusions (from `remote-deps.toml`). Invalid globs are
    /// logged and dropped.
    pub fn with_extra_exclusions(mut self, globs: &[String]) -> Self {
        for raw in globs {
            match glob::Pattern::new(raw) {
                Ok(pattern) => self.exclude.push(PathPattern::Glob(pattern)),
                Err(err) => tracing::warn!("ignoring invalid exclude pattern {raw:?}: {err}"),
            }
        }
        self
    }

    pub fn is_excluded(&self, segment: &str) -> bool {
        matches_any(segment, &self.exclude)
    }

    pub fn is_included_file(&self, file_name: &str) -> bool {
        !self.is_excluded(file_name) && self.include.iter().any(|re| re.is_match(file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_pattern_is_exact() {
        let pattern = PathPattern::Name("vendor".to_owned());
        assert!(pattern.matches("vendor"));
        assert!(!pattern.matches("vendored"));
        assert!(!pattern.matches("my_vendor"));
    }

    #[test]
    fn test_default_excludes_dependency_and_hidden_dirs() {
        let filter = WalkFilter::project_default();
        assert!(filter.is_excluded("node_modules"));
        assert!(filter.is_excluded("bower_components"));
        assert!(filter.is_excluded("vendor"));
        assert!(filter.is_excluded(".git"));
        assert!(filter.is_excluded(".cache"));
        assert!(!filter.is_excluded("src"));
        assert!(!filter.is_excluded("lib.ts"));
    }

    #[test]
    fn test_default_includes_script_extensions() {
        let filter = WalkFilter::project_default();
        for name in ["a.ts", "b.tsx", "c.js", "d.jsx", "types.d.ts"] {
            assert!(filter.is_included_file(name), "{name} should be included");
        }
        for name in ["README.md", "deno.json", "style.css", "a.ts.bak"] {
            assert!(!filter.is_included_file(name), "{name} should not be included");
        }
    }

    #[test]
    fn test_hidden_file_is_excluded_even_with_script_extension() {
        let filter = WalkFilter::project_default();
        assert!(!filter.is_included_file(".eslintrc.js"));
    }

    #[test]
    fn test_extra_glob_exclusions() {
        let filter = WalkFilter::project_default()
            .with_extra_exclusions(&["dist".to_owned(), "*.generated.ts".to_owned(), "[".to_owned()]);
        assert!(filter.is_excluded("dist"));
        assert!(!filter.is_included_file("api.generated.ts"));
        assert!(filter.is_included_file("api.ts"));
    }

    #[test]
    fn test_empty_filter_includes_nothing() {
        let filter = WalkFilter::default();
        assert!(!filter.is_excluded("anything"));
        assert!(!filter.is_included_file("a.ts"));
    }
}
