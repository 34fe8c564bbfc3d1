//! Module references carried in comments rather than statements:
//!
//! - `/// <reference path="./x.d.ts" />` and `/// <reference types="..." />`
//! - `// @deno-types="https://.../mod.d.ts"` type hints above an import

use std::sync::{LazyLock, OnceLock};

use regex::Regex;
use tree_sitter::{Language, Query, QueryCursor, StreamingIterator, Tree};

use crate::parser::imports::unquote;
use crate::parser::{ImportKind, SpecifierSite};
use crate::span::{Position, SourceSpan};

const COMMENT_QUERY: &str = "(comment) @comment";

static COMMENT_QUERY_CACHE: OnceLock<Query> = OnceLock::new();

// `lib="..."` references name built-in type libraries, not modules.
static REFERENCE_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^///\s*<reference\s+(?:path|types)\s*=\s*("[^"]*"|'[^']*')"#)
        .expect("reference directive regex")
});

static DENO_TYPES_HINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^//\s*@deno-types\s*=\s*("[^"]*"|'[^']*')"#).expect("deno-types regex")
});

fn comment_query(language: &Language) -> &'static Query {
    COMMENT_QUERY_CACHE.get_or_init(|| {
        Query::new(language, COMMENT_QUERY).expect("invalid comment query")
    })
}

/// Extract specifiers from reference directives and `@deno-types` hints.
///
/// Only `//` line comments are considered, so every match sits on the
/// comment's first line and its column is an offset from the comment start.
pub fn extract_directive_specifiers(
    tree: &Tree,
    source: &[u8],
    language: &Language,
) -> Vec<SpecifierSite> {
    let query = comment_query(language);
    let mut sites = Vec::new();
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, tree.root_node(), source);

    while let Some(m) = matches.next() {
        for capture in m.captures {
            let node = capture.node;
            let Ok(comment) = node.utf8_text(source) else {
                continue;
            };

            let found = REFERENCE_DIRECTIVE
                .captures(comment)
                .map(|c| (c, ImportKind::ReferenceDirective))
                .or_else(|| {
                    DENO_TYPES_HINT
                        .captures(comment)
                        .map(|c| (c, ImportKind::TypesHint))
                });
            let Some((caps, kind)) = found else {
                continue;
            };
            let Some(literal) = caps.get(1) else {
                continue;
            };
            let Some(text) = unquote(literal.as_str()).filter(|t| !t.is_empty()) else {
                continue;
            };

            let origin = node.start_position();
            sites.push(SpecifierSite {
                text: text.to_owned(),
                span: SourceSpan::new(
                    Position::new(origin.row, origin.column + literal.start()),
                    Position::new(origin.row, origin.column + literal.end()),
                ),
                kind,
            });
        }
    }

    sites
}
