//! URL canonicalization for consistent cache identities.

/// Error type for URL canonicalization failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<UrlError> for crate::Error {
    fn from(err: UrlError) -> Self {
        crate::Error::InvalidUrl(err.to_string())
    }
}

/// Canonicalize an absolute URL string.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Require an http(s) scheme
/// 3. Lowercase the host
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
pub fn canonicalize(input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let parsed = url::Url::parse(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    normalize(parsed)
}

/// Resolve a possibly relative identifier (`./index.html`, `/app.js`) against
/// the scope URL, then canonicalize it.
pub fn resolve(scope: &url::Url, input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let joined = scope.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    normalize(joined)
}

fn normalize(mut parsed: url::Url) -> Result<url::Url, UrlError> {
    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = parsed.host_str() {
        let lowered = host.to_lowercase();
        parsed
            .set_host(Some(&lowered))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> url::Url {
        url::Url::parse("https://app.example.com/webar/").unwrap()
    }

    #[test]
    fn test_canonicalize_lowercase_host() {
        let url = canonicalize("https://EXAMPLE.COM/Page").unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
        assert_eq!(url.path(), "/Page");
    }

    #[test]
    fn test_canonicalize_remove_fragment() {
        let url = canonicalize("https://example.com/index.html#top").unwrap();
        assert_eq!(url.fragment(), None);
        assert_eq!(url.as_str(), "https://example.com/index.html");
    }

    #[test]
    fn test_canonicalize_preserve_query() {
        let url = canonicalize("https://example.com/app.js?v=2&b=1").unwrap();
        assert_eq!(url.query(), Some("v=2&b=1"));
    }

    #[test]
    fn test_canonicalize_unsupported_scheme() {
        let result = canonicalize("file:///etc/passwd");
        assert!(matches!(result, Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_canonicalize_relative_rejected() {
        let result = canonicalize("./index.html");
        assert!(matches!(result, Err(UrlError::InvalidUrl(_))));
    }

    #[test]
    fn test_canonicalize_whitespace_only() {
        assert!(matches!(canonicalize("   "), Err(UrlError::Empty)));
    }

    #[test]
    fn test_resolve_dot_relative() {
        let url = resolve(&scope(), "./index.html").unwrap();
        assert_eq!(url.as_str(), "https://app.example.com/webar/index.html");
    }

    #[test]
    fn test_resolve_scope_root() {
        let url = resolve(&scope(), "./").unwrap();
        assert_eq!(url.as_str(), "https://app.example.com/webar/");
    }

    #[test]
    fn test_resolve_absolute_path() {
        let url = resolve(&scope(), "/offline.html").unwrap();
        assert_eq!(url.as_str(), "https://app.example.com/offline.html");
    }

    #[test]
    fn test_resolve_absolute_url_passes_through() {
        let url = resolve(&scope(), "https://CDN.example.com/lib.js#x").unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.com/lib.js");
    }
}
