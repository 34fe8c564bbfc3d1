pub mod directives;
pub mod imports;

use std::cell::RefCell;
use std::path::Path;

use tree_sitter::{Language, Parser};

use crate::error::ParseError;
use crate::resolver::specifier::is_remote;
use crate::span::SourceSpan;

use directives::extract_directive_specifiers;
use imports::extract_statement_specifiers;

// Thread-local Parser instances: one per worker thread, no lock contention.
thread_local! {
    static PARSER: RefCell<Parser> = RefCell::new({
        let mut p = Parser::new();
        p.set_language(&script_language())
            .expect("bundled TSX grammar matches the tree-sitter ABI");
        p
    });
}

/// The one grammar used for every script file.
///
/// TSX is a superset that accepts plain JavaScript, JSX, and TypeScript type
/// syntax, so mixed-dialect projects parse with a single configuration. The
/// only TypeScript form it rejects is the `<T>expr` cast, which never contains
/// an import; tree-sitter recovers around it.
pub fn script_language() -> Language {
    tree_sitter_typescript::LANGUAGE_TSX.into()
}

/// The syntactic form a specifier was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportKind {
    /// `import ... from "X"` or `import "X"`
    Import,
    /// `export ... from "X"`
    ExportFrom,
    /// `import("X")`
    DynamicImport,
    /// `import x = require("X")`
    ImportRequire,
    /// `/// <reference path="X" />` or `/// <reference types="X" />`
    ReferenceDirective,
    /// `// @deno-types="X"`
    TypesHint,
}

impl ImportKind {
    /// Short label for human-readable output.
    pub fn label(self) -> &'static str {
        match self {
            Self::Import => "import",
            Self::ExportFrom => "export",
            Self::DynamicImport => "dynamic",
            Self::ImportRequire => "require",
            Self::ReferenceDirective => "reference",
            Self::TypesHint => "types",
        }
    }
}

impl std::fmt::Display for ImportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One specifier occurrence: the text as written, where, and in what form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecifierSite {
    pub text: String,
    pub span: SourceSpan,
    pub kind: ImportKind,
}

/// A specifier straight out of the parser.
///
/// `Remote` is decided at extraction time for text that is already an absolute
/// http(s) URL; such specifiers skip import-map resolution entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawSpecifier {
    Local(SpecifierSite),
    Remote(SpecifierSite),
}

impl RawSpecifier {
    pub fn classify(site: SpecifierSite) -> Self {
        if is_remote(&site.text) {
            Self::Remote(site)
        } else {
            Self::Local(site)
        }
    }

    pub fn site(&self) -> &SpecifierSite {
        match self {
            Self::Local(site) | Self::Remote(site) => site,
        }
    }
}

/// Parse one file's text and extract its module specifiers in source order.
///
/// tree-sitter recovers from syntax errors, so statements that are intact in an
/// otherwise broken file are still reported.
///
/// # Errors
/// Returns [`ParseError::NoTree`] if tree-sitter yields no tree at all.
pub fn extract(text: &str, path: &Path) -> Result<Vec<RawSpecifier>, ParseError> {
    let source = text.as_bytes();
    let tree = PARSER
        .with(|p| p.borrow_mut().parse(source, None))
        .ok_or(ParseError::NoTree)?;

    if tree.root_node().has_error() {
        tracing::debug!("{}: syntax errors, extracting what parsed", path.display());
    }

    let language = script_language();
    let mut sites = extract_statement_specifiers(&tree, source, &language);
    sites.extend(extract_directive_specifiers(&tree, source, &language));
    sites.sort_by_key(|site| site.span.start);

    Ok(sites.into_iter().map(RawSpecifier::classify).collect())
}
