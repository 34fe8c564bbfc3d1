use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ImportMapError;

/// On-disk import map: `{ "imports": { "alias": "target", ... } }`.
/// Other top-level keys (e.g. `scopes`) are accepted and ignored.
#[derive(Debug, Deserialize)]
struct ImportMapFile {
    #[serde(default)]
    imports: serde_json::Map<String, serde_json::Value>,
}

/// Specifier remapping table, immutable once loaded.
///
/// Resolution precedence:
/// 1. an alias equal to the whole specifier;
/// 2. otherwise the longest alias ending in `/` that prefixes the specifier,
///    whose prefix is replaced by the target and the remainder kept;
/// 3. otherwise the specifier is returned unchanged.
///
/// A result that is a relative path (`./` or `../`) is anchored at the import
/// map file's directory.
#[derive(Debug, Clone, Default)]
pub struct ImportMap {
    imports: Vec<(String, String)>,
    base_dir: Option<PathBuf>,
}

impl ImportMap {
    /// Identity map: every specifier resolves to itself.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a map from in-memory entries, with no base directory.
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            imports: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            base_dir: None,
        }
    }

    /// Load an import map from `path`.
    ///
    /// # Errors
    /// [`ImportMapError::Read`] if the file cannot be read,
    /// [`ImportMapError::Malformed`] if it is not an import map JSON object.
    pub fn load(path: &Path) -> Result<Self, ImportMapError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ImportMapError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ImportMapFile =
            serde_json::from_str(&contents).map_err(|source| ImportMapError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;

        let imports = file
            .imports
            .into_iter()
            .filter_map(|(alias, target)| match target.as_str() {
                Some(t) => Some((alias, t.to_owned())),
                None => {
                    tracing::warn!("import map {}: ignoring non-string target for {alias:?}", path.display());
                    None
                }
            })
            .collect();

        Ok(Self {
            imports,
            base_dir: path.parent().map(Path::to_path_buf),
        })
    }

    /// Load the map at `path` if given; any failure falls back to the identity
    /// map with a warning.
    pub fn create(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::empty();
        };
        match Self::load(path) {
            Ok(map) => map,
            Err(err) => {
                tracing::warn!("{err}. Using no import map.");
                Self::empty()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.imports.is_empty()
    }

    pub fn len(&self) -> usize {
        self.imports.len()
    }

    /// Map `specifier` through the alias table. See the type docs for precedence.
    pub fn resolve_module(&self, specifier: &str) -> String {
        if let Some((_, target)) = self.imports.iter().find(|(alias, _)| alias == specifier) {
            return self.anchor(target.clone());
        }

        let longest_prefix = self
            .imports
            .iter()
            .filter(|(alias, _)| alias.ends_with('/') && specifier.starts_with(alias.as_str()))
            .max_by_key(|(alias, _)| alias.len());

        match longest_prefix {
            Some((alias, target)) => {
                let remainder = &specifier[alias.len()..];
                self.anchor(format!("{target}{remainder}"))
            }
            None => specifier.to_owned(),
        }
    }

    fn anchor(&self, resolved: String) -> String {
        match &self.base_dir {
            Some(dir) if resolved.starts_with("./") || resolved.starts_with("../") => {
                path_clean::clean(dir.join(&resolved))
                    .to_string_lossy()
                    .into_owned()
            }
            _ => resolved,
        }
    }
}
