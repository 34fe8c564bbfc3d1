use url::Url;

/// Returns true when `specifier` is an absolute `http`/`https` URL with a host.
///
/// Purely syntactic: nothing is fetched. The text must spell out the
/// `scheme://` authority form; `https:foo` style strings that the URL parser
/// would normalise are not treated as remote.
pub fn is_remote(specifier: &str) -> bool {
    let Some((scheme, _)) = specifier.split_once("://") else {
        return false;
    };
    if !scheme.eq_ignore_ascii_case("http") && !scheme.eq_ignore_ascii_case("https") {
        return false;
    }
    match Url::parse(specifier) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.has_host(),
        Err(_) => false,
    }
}
