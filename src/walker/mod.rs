pub mod filter;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{DepsError, WalkError};

pub use filter::{PathPattern, WalkFilter};

/// Lazy, depth-first walk over the script files under a project root.
///
/// Yields absolute paths of files that pass the [`WalkFilter`]. Unreadable
/// subdirectories and symlink loops come out as `Err(WalkError)` items and the
/// walk carries on with the next entry. Each `FileWalker` is a fresh traversal;
/// to walk again, construct a new one.
pub struct FileWalker {
    inner: ignore::Walk,
    filter: Arc<WalkFilter>,
}

impl FileWalker {
    /// Start a walk at `root`.
    ///
    /// # Errors
    /// Returns [`DepsError::RootUnreadable`] if `root` is missing, not a
    /// directory, or cannot be listed.
    pub fn new(root: &Path, filter: WalkFilter) -> Result<Self, DepsError> {
        let root_error = |source| DepsError::RootUnreadable {
            path: root.to_path_buf(),
            source,
        };

        let root = std::path::absolute(root).map_err(root_error)?;
        if !root.is_dir() {
            return Err(root_error(std::io::Error::new(
                std::io::ErrorKind::NotADirectory,
                "not a directory",
            )));
        }
        std::fs::read_dir(&root).map_err(root_error)?;
        let boundary = root.canonicalize().map_err(root_error)?;

        let filter = Arc::new(filter);
        let prune = Arc::clone(&filter);

        let inner = ignore::WalkBuilder::new(&root)
            // Only the WalkFilter decides what is skipped: no .gitignore,
            // no .ignore files, no built-in hidden-file rule.
            .standard_filters(false)
            // Loops are detected by the walker via directory identity and
            // reported as errors.
            .follow_links(true)
            .sort_by_file_name(|a, b| a.cmp(b))
            // The root (depth 0) is never passed through filter_entry.
            .filter_entry(move |entry| {
                if entry.path_is_symlink() && !links_inside(entry.path(), &boundary) {
                    tracing::debug!(
                        "{}: link leaves the project root, skipped",
                        entry.path().display()
                    );
                    return false;
                }
                entry
                    .file_name()
                    .to_str()
                    .map(|name| !prune.is_excluded(name))
                    .unwrap_or(true)
            })
            .build();

        Ok(Self { inner, filter })
    }

    /// Convenience for callers that only want the paths: drains the walk,
    /// logging and dropping directory errors.
    pub fn collect_files(self) -> Vec<PathBuf> {
        self.filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(err) => {
                tracing::warn!("{err}");
                None
            }
        })
        .collect()
    }
}

/// True if `link` resolves to a path under `boundary`. Dangling links resolve
/// to nothing and count as outside.
fn links_inside(link: &Path, boundary: &Path) -> bool {
    std::fs::canonicalize(link)
        .map(|target| target.starts_with(boundary))
        .unwrap_or(false)
}

impl Iterator for FileWalker {
    type Item = Result<PathBuf, WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(err) => return Some(Err(err.into())),
            };

            if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                continue;
            }

            let included = entry
                .file_name()
                .to_str()
                .map(|name| self.filter.is_included_file(name))
                .unwrap_or(false);
            if included {
                return Some(Ok(entry.into_path()));
            }
        }
    }
}
