pub mod import_map;
pub mod specifier;

pub use import_map::ImportMap;
pub use specifier::is_remote;

use crate::parser::{RawSpecifier, SpecifierSite};

/// Turn a raw specifier into the text that gets classified.
///
/// `Remote` specifiers are already final; only `Local` ones go through the
/// import map.
pub fn resolve_specifier(raw: RawSpecifier, import_map: &ImportMap) -> (String, SpecifierSite) {
    match raw {
        RawSpecifier::Remote(site) => (site.text.clone(), site),
        RawSpecifier::Local(site) => (import_map.resolve_module(&site.text), site),
    }
}
