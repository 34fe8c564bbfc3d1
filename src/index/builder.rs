use std::path::PathBuf;
use std::time::Instant;

use rayon::prelude::*;

use crate::error::{DepsError, Diagnostic, WalkError};
use crate::index::{CancelToken, DependencyEdge, DependencyIndex};
use crate::parser::{self, RawSpecifier};
use crate::resolver::{ImportMap, resolve_specifier};
use crate::walker::{FileWalker, WalkFilter};

/// Everything a successful build produces.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub index: DependencyIndex,
    /// Non-fatal problems, in the order they were met.
    pub diagnostics: Vec<Diagnostic>,
    /// Files read and parsed successfully.
    pub files_scanned: usize,
    /// Wall-clock time for the build in seconds.
    pub elapsed_secs: f64,
}

impl BuildReport {
    /// Files that were walked but could not be read or parsed.
    pub fn files_skipped(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_file_skip()).count()
    }
}

/// What happened to one walk entry.
enum FileOutcome {
    Scanned {
        path: PathBuf,
        specifiers: Vec<RawSpecifier>,
    },
    Skipped(Diagnostic),
}

/// Builds a [`DependencyIndex`] for one project root.
///
/// ```ignore
/// let report = IndexBuilder::new("/path/to/project")
///     .import_map(Some("/path/to/project/import_map.json".into()))
///     .jobs(4)
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct IndexBuilder {
    root: PathBuf,
    import_map: Option<PathBuf>,
    exclude: Vec<String>,
    jobs: usize,
    cancel: CancelToken,
}

impl IndexBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            import_map: None,
            exclude: Vec::new(),
            jobs: 1,
            cancel: CancelToken::new(),
        }
    }

    /// Import map file, already resolved against the project root by the caller.
    pub fn import_map(mut self, path: Option<PathBuf>) -> Self {
        self.import_map = path;
        self
    }

    /// Extra glob exclusions on top of the default dependency/hidden directories.
    pub fn exclude(mut self, patterns: Vec<String>) -> Self {
        self.exclude = patterns;
        self
    }

    /// Number of worker threads reading and parsing files. `1` (the default)
    /// processes files one at a time as the walk discovers them.
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Walk the project, extract and resolve every specifier, and index the
    /// remote ones.
    ///
    /// # Errors
    /// - [`DepsError::RootUnreadable`] if the project root cannot be listed.
    /// - [`DepsError::Cancelled`] if the cancel token trips; partial results
    ///   are dropped.
    /// - [`DepsError::WorkerPool`] if `jobs > 1` and the pool cannot start.
    ///
    /// Unreadable directories or files, parse failures, and a bad import map
    /// are recorded in [`BuildReport::diagnostics`] instead.
    pub fn build(&self) -> Result<BuildReport, DepsError> {
        let start = Instant::now();
        let mut report = BuildReport::default();

        let import_map = self.load_import_map(&mut report.diagnostics);
        let filter = WalkFilter::project_default().with_extra_exclusions(&self.exclude);
        let walker = FileWalker::new(&self.root, filter)?;

        if self.jobs == 1 {
            for entry in walker {
                self.cancel.check()?;
                absorb(&mut report, &import_map, outcome_for(entry));
            }
        } else {
            for outcome in self.scan_parallel(walker)? {
                absorb(&mut report, &import_map, outcome);
            }
        }

        report.elapsed_secs = start.elapsed().as_secs_f64();
        tracing::info!(
            "indexed {} remote specifiers ({} references) from {} files in {:.2}s",
            report.index.len(),
            report.index.edge_count(),
            report.files_scanned,
            report.elapsed_secs,
        );
        Ok(report)
    }

    fn load_import_map(&self, diagnostics: &mut Vec<Diagnostic>) -> ImportMap {
        let Some(path) = &self.import_map else {
            return ImportMap::empty();
        };
        match ImportMap::load(path) {
            Ok(map) => {
                tracing::debug!("loaded {} import map entries from {}", map.len(), path.display());
                map
            }
            Err(err) => {
                tracing::debug!("{err}. Continuing without an import map.");
                diagnostics.push(Diagnostic::from(&err));
                ImportMap::empty()
            }
        }
    }

    /// Read and parse files on a bounded pool.
    ///
    /// The walk is drained first so every entry keeps its walk position;
    /// an indexed `collect` returns outcomes in that same order.
    fn scan_parallel(&self, walker: FileWalker) -> Result<Vec<FileOutcome>, DepsError> {
        let mut entries = Vec::new();
        for entry in walker {
            self.cancel.check()?;
            entries.push(entry);
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
            .map_err(|e| DepsError::WorkerPool(e.to_string()))?;

        pool.install(|| {
            entries
                .into_par_iter()
                .map(|entry| -> Result<FileOutcome, DepsError> {
                    self.cancel.check()?;
                    Ok(outcome_for(entry))
                })
                .collect()
        })
    }
}

fn outcome_for(entry: Result<PathBuf, WalkError>) -> FileOutcome {
    match entry {
        Ok(path) => scan_file(path),
        Err(err) => FileOutcome::Skipped(err.into()),
    }
}

/// Read and parse one file. Failures are contained to this file.
///
/// Bytes that are not valid UTF-8 decode to U+FFFD, so a stray Latin-1 byte in
/// a comment does not cost the file its imports.
fn scan_file(path: PathBuf) -> FileOutcome {
    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(err) => {
            return FileOutcome::Skipped(Diagnostic::FileUnreadable {
                message: err.to_string(),
                path,
            });
        }
    };

    let text = String::from_utf8_lossy(&bytes);
    match parser::extract(&text, &path) {
        Ok(specifiers) => {
            tracing::debug!("{}: {} specifiers", path.display(), specifiers.len());
            FileOutcome::Scanned { path, specifiers }
        }
        Err(err) => FileOutcome::Skipped(Diagnostic::ParseFailed {
            message: err.to_string(),
            path,
        }),
    }
}

/// Fold one file's outcome into the report. Only ever appends, so a failing
/// file cannot disturb entries from earlier files.
fn absorb(report: &mut BuildReport, import_map: &ImportMap, outcome: FileOutcome) {
    match outcome {
        FileOutcome::Scanned { path, specifiers } => {
            report.files_scanned += 1;
            for raw in specifiers {
                let (resolved, site) = resolve_specifier(raw, import_map);
                let edge = DependencyEdge {
                    filepath: path.clone(),
                    location: site.span,
                    kind: site.kind,
                };
                report.index.record(resolved, edge);
            }
        }
        FileOutcome::Skipped(diagnostic) => {
            tracing::debug!("{diagnostic}");
            report.diagnostics.push(diagnostic);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ImportKind;
    use crate::span::Position;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("tempdir")
    }

    fn build_index(root: &Path, import_map: Option<PathBuf>) -> Result<BuildReport, DepsError> {
        IndexBuilder::new(root).import_map(import_map).build()
    }

    fn write(root: &Path, rel: &str, contents: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_remote_import_without_import_map() {
        let dir = tmp();
        let file = write(
            dir.path(),
            "main.ts",
            "import x from \"https://deno.land/std/mod.ts\";\n",
        );

        let report = build_index(dir.path(), None).unwrap();
        assert_eq!(report.index.len(), 1);
        let edges = report.index.get("https://deno.land/std/mod.ts").unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].filepath, file);
        assert_eq!(edges[0].location.start, Position::new(0, 14));
        assert_eq!(edges[0].location.end, Position::new(0, 44));
        assert_eq!(edges[0].kind, ImportKind::Import);
    }

    #[test]
    fn test_prefix_alias_from_import_map() {
        let dir = tmp();
        write(dir.path(), "main.ts", "import x from \"lib/mod.ts\";\n");
        let map = write(
            dir.path(),
            "import_map.json",
            r#"{ "imports": { "lib/": "https://cdn.test/lib/" } }"#,
        );

        let report = build_index(dir.path(), Some(map)).unwrap();
        let keys: Vec<_> = report.index.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["https://cdn.test/lib/mod.ts"]);
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn test_local_specifiers_are_dropped() {
        let dir = tmp();
        write(dir.path(), "main.ts", "import x from \"./local.ts\";\nimport y from \"react\";\n");
        write(dir.path(), "local.ts", "export const x = 1;\n");

        let report = build_index(dir.path(), None).unwrap();
        assert!(report.index.is_empty());
        assert_eq!(report.files_scanned, 2);
    }

    #[test]
    fn test_excluded_directories_contribute_nothing() {
        let dir = tmp();
        write(
            dir.path(),
            "node_modules/pkg/a.ts",
            "import x from \"https://x.test/hidden.ts\";\n",
        );
        write(
            dir.path(),
            ".git/hooks/b.js",
            "import x from \"https://x.test/hidden.ts\";\n",
        );
        write(dir.path(), "src/c.ts", "import x from \"https://x.test/seen.ts\";\n");

        let report = build_index(dir.path(), None).unwrap();
        assert!(report.index.get("https://x.test/hidden.ts").is_none());
        assert_eq!(report.index.get("https://x.test/seen.ts").unwrap().len(), 1);
        for (_, edges) in report.index.iter() {
            for edge in edges {
                let s = edge.filepath.to_string_lossy();
                assert!(!s.contains("node_modules") && !s.contains(".git"));
            }
        }
    }

    #[test]
    fn test_broken_file_does_not_disturb_others() {
        let dir = tmp();
        write(dir.path(), "a.ts", "import a from \"https://x.test/shared.ts\";\n");
        write(dir.path(), "b.ts", "@@@ }}} ((( \"unterminated");
        write(dir.path(), "c.ts", "import c from \"https://x.test/shared.ts\";\n");
        // Not UTF-8: decoded lossily and scanned like any other file.
        fs::write(dir.path().join("d.ts"), [0xff, 0xfe, 0x00, 0x81]).unwrap();

        let report = build_index(dir.path(), None).unwrap();
        let edges = report.index.get("https://x.test/shared.ts").unwrap();
        assert_eq!(edges.len(), 2);
        assert!(edges[0].filepath.ends_with("a.ts"));
        assert!(edges[1].filepath.ends_with("c.ts"));
        assert_eq!(report.files_scanned, 4);
        assert_eq!(report.files_skipped(), 0);
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn test_invalid_utf8_comment_keeps_imports() {
        let dir = tmp();
        let mut bytes = b"// caf".to_vec();
        bytes.push(0xe9);
        bytes.extend_from_slice(b"\nimport x from \"https://deno.land/std/mod.ts\";\n");
        fs::write(dir.path().join("latin1.ts"), bytes).unwrap();

        let report = build_index(dir.path(), None).unwrap();
        assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
        let edges = report.index.get("https://deno.land/std/mod.ts").unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].location.start, Position::new(1, 14));
    }

    #[cfg(unix)]
    #[test]
    fn test_walk_error_becomes_diagnostic() {
        let dir = tmp();
        write(dir.path(), "src/a.ts", "import a from \"https://x.test/a.ts\";\n");
        std::os::unix::fs::symlink(dir.path(), dir.path().join("src/loop")).unwrap();

        let report = build_index(dir.path(), None).unwrap();
        assert!(
            report
                .diagnostics
                .iter()
                .any(|d| matches!(d, Diagnostic::DirectoryUnreadable { .. })),
            "{:?}",
            report.diagnostics
        );
        assert_eq!(report.files_skipped(), 0);
        let edges = report.index.get("https://x.test/a.ts").unwrap();
        assert_eq!(edges.len(), 1);
        assert!(edges[0].filepath.ends_with("src/a.ts"));
    }

    #[test]
    fn test_remote_specifiers_bypass_import_map() {
        let dir = tmp();
        write(dir.path(), "main.ts", "import x from \"https://deno.land/std/mod.ts\";\n");
        let map = write(
            dir.path(),
            "import_map.json",
            r#"{ "imports": { "https://deno.land/": "https://mirror.test/" } }"#,
        );

        let report = build_index(dir.path(), Some(map)).unwrap();
        assert!(report.index.get("https://deno.land/std/mod.ts").is_some());
        assert!(report.index.get("https://mirror.test/std/mod.ts").is_none());
    }

    #[test]
    fn test_bad_import_map_is_a_diagnostic() {
        let dir = tmp();
        write(dir.path(), "main.ts", "import x from \"https://x.test/a.ts\";\n");
        let map = write(dir.path(), "import_map.json", "not json");

        let report = build_index(dir.path(), Some(map)).unwrap();
        assert_eq!(report.index.len(), 1);
        assert!(matches!(
            report.diagnostics.as_slice(),
            [Diagnostic::ImportMapUnavailable { .. }]
        ));
    }

    #[test]
    fn test_edges_follow_walk_then_source_order() {
        let dir = tmp();
        let url = "https://x.test/mod.ts";
        write(
            dir.path(),
            "a/first.ts",
            &format!("import a from \"{url}\";\nexport * from \"{url}\";\n"),
        );
        write(dir.path(), "b/second.ts", &format!("await import(\"{url}\");\n"));

        let report = build_index(dir.path(), None).unwrap();
        let edges = report.index.get(url).unwrap();
        let lines: Vec<_> = edges
            .iter()
            .map(|e| {
                (
                    e.filepath.file_name().unwrap().to_string_lossy().into_owned(),
                    e.location.start.line,
                )
            })
            .collect();
        assert_eq!(
            lines,
            vec![
                ("first.ts".to_owned(), 0),
                ("first.ts".to_owned(), 1),
                ("second.ts".to_owned(), 0),
            ]
        );
    }

    #[test]
    fn test_repeated_builds_are_equal() {
        let dir = tmp();
        write(dir.path(), "a.ts", "import a from \"https://x.test/a.ts\";\n");
        write(dir.path(), "b/c.tsx", "import b from \"https://x.test/b.ts\";\n");

        let first = build_index(dir.path(), None).unwrap();
        let second = build_index(dir.path(), None).unwrap();
        assert_eq!(first.index, second.index);
    }

    #[test]
    fn test_parallel_build_matches_sequential() {
        let dir = tmp();
        for i in 0..40 {
            write(
                dir.path(),
                &format!("pkg{}/file{i}.ts", i % 5),
                &format!(
                    "import a from \"https://x.test/shared.ts\";\nimport b from \"https://x.test/only{i}.ts\";\n"
                ),
            );
        }

        let sequential = IndexBuilder::new(dir.path()).build().unwrap();
        let parallel = IndexBuilder::new(dir.path()).jobs(4).build().unwrap();
        assert_eq!(sequential.index, parallel.index);
        assert_eq!(parallel.index.get("https://x.test/shared.ts").unwrap().len(), 40);
    }

    #[test]
    fn test_extra_exclusions_apply() {
        let dir = tmp();
        write(dir.path(), "dist/bundle.js", "import a from \"https://x.test/a.ts\";\n");
        write(dir.path(), "src/main.ts", "import b from \"https://x.test/b.ts\";\n");

        let report = IndexBuilder::new(dir.path())
            .exclude(vec!["dist".to_owned()])
            .build()
            .unwrap();
        assert!(report.index.get("https://x.test/a.ts").is_none());
        assert!(report.index.get("https://x.test/b.ts").is_some());
    }

    #[test]
    fn test_cancelled_build_returns_error() {
        let dir = tmp();
        write(dir.path(), "a.ts", "import a from \"https://x.test/a.ts\";\n");
        let token = CancelToken::new();
        token.cancel();

        let result = IndexBuilder::new(dir.path()).cancel_token(token.clone()).build();
        assert!(matches!(result, Err(DepsError::Cancelled)));

        let result = IndexBuilder::new(dir.path()).cancel_token(token).jobs(2).build();
        assert!(matches!(result, Err(DepsError::Cancelled)));
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let dir = tmp();
        let result = build_index(&dir.path().join("missing"), None);
        assert!(matches!(result, Err(DepsError::RootUnreadable { .. })));
    }
}
