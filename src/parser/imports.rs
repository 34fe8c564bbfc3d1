use std::sync::OnceLock;

use tree_sitter::{Language, Node, Query, QueryCursor, StreamingIterator, Tree};

use crate::parser::{ImportKind, SpecifierSite};
use crate::span::SourceSpan;

// ---------------------------------------------------------------------------
// Query strings
// ---------------------------------------------------------------------------

/// One pattern per statement form. Every pattern captures the whole string
/// literal (quotes included) as `@literal`; the pattern index tells the form.
///
/// 0. `import x from "X"`, `import "X"`, `import type { T } from "X"`
/// 1. `export { x } from "X"`, `export * from "X"`, `export * as ns from "X"`
/// 2. `import("X")`
/// 3. `import x = require("X")` (TypeScript)
const SPECIFIER_QUERY: &str = r#"
    (import_statement
      source: (string) @literal)

    (export_statement
      source: (string) @literal)

    (call_expression
      function: (import)
      arguments: (arguments (string) @literal))

    (import_require_clause
      (string) @literal)
"#;

static SPECIFIER_QUERY_CACHE: OnceLock<Query> = OnceLock::new();

/// There is exactly one grammar in play, so a single cached query is enough.
fn specifier_query(language: &Language) -> &'static Query {
    SPECIFIER_QUERY_CACHE.get_or_init(|| {
        Query::new(language, SPECIFIER_QUERY).expect("invalid specifier query")
    })
}

fn kind_for_pattern(pattern_index: usize) -> ImportKind {
    match pattern_index {
        0 => ImportKind::Import,
        1 => ImportKind::ExportFrom,
        2 => ImportKind::DynamicImport,
        _ => ImportKind::ImportRequire,
    }
}

// ---------------------------------------------------------------------------
// Helper utilities
// ---------------------------------------------------------------------------

/// The specifier as written: the literal's text without its surrounding quotes.
///
/// Escape sequences are kept verbatim. Returns `None` for a literal that is
/// missing its closing quote (tree-sitter error recovery can produce these).
pub(crate) fn unquote(literal: &str) -> Option<&str> {
    let mut chars = literal.chars();
    let open = chars.next()?;
    let close = chars.next_back()?;
    if !matches!(open, '"' | '\'') || open != close {
        return None;
    }
    Some(&literal[1..literal.len() - 1])
}

fn literal_site(node: Node, source: &[u8], kind: ImportKind) -> Option<SpecifierSite> {
    if node.has_error() || node.is_missing() {
        return None;
    }
    let literal = node.utf8_text(source).ok()?;
    let text = unquote(literal)?;
    if text.is_empty() {
        return None;
    }
    Some(SpecifierSite {
        text: text.to_owned(),
        span: SourceSpan::of_node(node),
        kind,
    })
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Extract every module specifier written in an import, export-from, dynamic
/// import, or import-require form, in no particular order.
pub fn extract_statement_specifiers(
    tree: &Tree,
    source: &[u8],
    language: &Language,
) -> Vec<SpecifierSite> {
    let query = specifier_query(language);
    let literal_idx = query
        .capture_index_for_name("literal")
        .expect("specifier query must have @literal");

    let mut sites = Vec::new();
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, tree.root_node(), source);

    while let Some(m) = matches.next() {
        let kind = kind_for_pattern(m.pattern_index);
        for capture in m.captures {
            if capture.index != literal_idx {
                continue;
            }
            if let Some(site) = literal_site(capture.node, source, kind) {
                sites.push(site);
            }
        }
    }

    sites
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
