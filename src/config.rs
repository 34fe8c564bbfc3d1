use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Name of the optional per-project configuration file.
pub const CONFIG_FILE: &str = "remote-deps.toml";

/// Configuration loaded from `remote-deps.toml` at the project root.
#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RemoteDepsConfig {
    /// Import map file, relative to the project root or absolute.
    pub import_map: Option<PathBuf>,
    /// Additional glob patterns to exclude, matched against each path segment
    /// (beyond the dependency and hidden directories that are always skipped).
    pub exclude: Option<Vec<String>>,
}

impl RemoteDepsConfig {
    /// Load configuration from `remote-deps.toml` in the given root directory.
    ///
    /// Returns a default (empty) configuration if the file does not exist or cannot be parsed.
    pub fn load(root: &Path) -> Self {
        let config_path = root.join(CONFIG_FILE);

        if !config_path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match toml::from_str::<Self>(&contents) {
                Ok(config) => config,
                Err(err) => {
                    tracing::warn!("failed to parse {CONFIG_FILE}: {err}. Using defaults.");
                    Self::default()
                }
            },
            Err(err) => {
                tracing::warn!("failed to read {CONFIG_FILE}: {err}. Using defaults.");
                Self::default()
            }
        }
    }

    /// The configured import map as an absolute path, resolving a relative
    /// setting against `root`.
    pub fn import_map_path(&self, root: &Path) -> Option<PathBuf> {
        self.import_map.as_ref().map(|p| {
            if p.is_absolute() {
                p.clone()
            } else {
                path_clean::clean(root.join(p))
            }
        })
    }

    pub fn exclude_patterns(&self) -> Vec<String> {
        self.exclude.clone().unwrap_or_default()
    }
}
