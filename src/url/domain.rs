use url::Url;

/// Extracts the host from a URL, lowercased, without the port
///
/// Returns `None` for URLs without a host component.
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_ascii_lowercase())
}

/// Checks whether two URLs belong to the same domain
///
/// Comparison is by exact host equality; `blog.example.com` and
/// `example.com` are different domains for traversal purposes.
pub fn is_same_domain(a: &Url, b: &Url) -> bool {
    match (a.host_str(), b.host_str()) {
        (Some(ha), Some(hb)) => ha.eq_ignore_ascii_case(hb),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_host() {
        let url = Url::parse("https://Example.COM/page").unwrap();
        assert_eq!(extract_host(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_host_excludes_port() {
        let url = Url::parse("https://example.com:8443/page").unwrap();
        assert_eq!(extract_host(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_same_domain() {
        let a = Url::parse("https://a.example/x").unwrap();
        let b = Url::parse("https://a.example/y?q=1").unwrap();
        assert!(is_same_domain(&a, &b));
    }

    #[test]
    fn test_different_domain() {
        let a = Url::parse("https://a.example/x").unwrap();
        let b = Url::parse("https://other.example/y").unwrap();
        assert!(!is_same_domain(&a, &b));
    }

    #[test]
    fn test_subdomain_is_different() {
        let a = Url::parse("https://example.com/").unwrap();
        let b = Url::parse("https://blog.example.com/").unwrap();
        assert!(!is_same_domain(&a, &b));
    }
}
