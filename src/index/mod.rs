pub mod builder;
pub mod cancel;

pub use builder::{BuildReport, IndexBuilder};
pub use cancel::CancelToken;

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::parser::ImportKind;
use crate::resolver::is_remote;
use crate::span::SourceSpan;

/// One occurrence of a remote specifier: the file that references it, the
/// span of the literal inside that file, and the form it was written in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEdge {
    pub filepath: PathBuf,
    pub location: SourceSpan,
    pub kind: ImportKind,
}

/// Reverse dependency index: remote specifier -> every place that references it.
///
/// Edges for a key keep insertion order (walk order, then order within the
/// file) and are never deduplicated. Only remote specifiers can become keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyIndex {
    entries: BTreeMap<String, Vec<DependencyEdge>>,
}

impl DependencyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an edge under `specifier` if it is remote.
    ///
    /// Returns `false` (and records nothing) for local specifiers.
    pub fn record(&mut self, specifier: String, edge: DependencyEdge) -> bool {
        if !is_remote(&specifier) {
            return false;
        }
        self.entries.entry(specifier).or_default().push(edge);
        true
    }

    pub fn get(&self, specifier: &str) -> Option<&[DependencyEdge]> {
        self.entries.get(specifier).map(Vec::as_slice)
    }

    /// Iterate `(specifier, edges)` in specifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[DependencyEdge])> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of distinct remote specifiers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of edges across all specifiers.
    pub fn edge_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}
