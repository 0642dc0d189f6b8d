//! Feed endpoint canonicalization.

/// Why a configured feed URL was rejected.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("missing host")]
    MissingHost,

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Normalize a configured feed endpoint.
///
/// Trims whitespace, defaults the scheme to `https`, lowercases the host
/// and drops any fragment. The query string is kept as given.
pub fn canonicalize(input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let candidate = if trimmed.contains("://") { trimmed.to_string() } else { format!("https://{trimmed}") };
    let mut parsed = url::Url::parse(&candidate).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(UrlError::UnsupportedScheme(parsed.scheme().to_string()));
    }

    let host = parsed.host_str().map(str::to_lowercase).ok_or(UrlError::MissingHost)?;
    parsed
        .set_host(Some(&host))
        .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    parsed.set_fragment(None);

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_explicit_http() {
        let url = canonicalize("http://feeds.example.com/essential").unwrap();
        assert_eq!(url.as_str(), "http://feeds.example.com/essential");
    }

    #[test]
    fn test_defaults_to_https_and_lowercases_host() {
        let url = canonicalize("FEEDS.Example.com/v1/feed").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_str(), Some("feeds.example.com"));
        assert_eq!(url.path(), "/v1/feed");
    }

    #[test]
    fn test_keeps_query_and_drops_fragment() {
        let url = canonicalize("https://example.com/feed?page=2&size=20#latest").unwrap();
        assert_eq!(url.query(), Some("page=2&size=20"));
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_rejects_blank_input() {
        assert!(matches!(canonicalize(""), Err(UrlError::Empty)));
        assert!(matches!(canonicalize(" \t "), Err(UrlError::Empty)));
    }

    #[test]
    fn test_rejects_other_schemes() {
        assert!(matches!(canonicalize("file:///tmp/feed.json"), Err(UrlError::UnsupportedScheme(s)) if s == "file"));
    }

    #[test]
    fn test_rejects_unparseable() {
        assert!(matches!(canonicalize("https://exa mple.com"), Err(UrlError::InvalidUrl(_))));
    }
}
