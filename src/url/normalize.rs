use crate::UrlError;
use url::Url;

/// Normalizes a URL for deduplication comparison
///
/// Two URLs that normalize equal are considered the same page.
///
/// # Normalization Steps
///
/// 1. Resolve relative URLs against `base` (the discovering page)
/// 2. Reject anything that is not http/https or has no host
/// 3. Lowercase scheme and host, strip default ports (the `url` crate
///    performs both during parsing)
/// 4. Strip the fragment entirely
/// 5. Strip trailing slashes from a non-root path (root stays `/`)
/// 6. Preserve the query string verbatim - distinct queries are distinct
///    pages
///
/// # Arguments
///
/// * `input` - The URL string to normalize, absolute or relative
/// * `base` - The URL of the page the link was found on, if any
///
/// # Returns
///
/// * `Ok(Url)` - Normalized URL
/// * `Err(UrlError)` - Unparseable input; callers drop the link
///
/// # Examples
///
/// ```
/// use crawlcore::url::normalize;
///
/// let url = normalize("HTTP://Example.COM:80/page/#top", None).unwrap();
/// assert_eq!(url.as_str(), "http://example.com/page");
/// ```
pub fn normalize(input: &str, base: Option<&Url>) -> Result<Url, UrlError> {
    let mut url = match base {
        Some(base) => base
            .join(input)
            .map_err(|e| UrlError::Parse(format!("{}: {}", input, e)))?,
        None => Url::parse(input).map_err(|e| UrlError::Parse(format!("{}: {}", input, e)))?,
    };

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);

    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/');
        let trimmed = if trimmed.is_empty() { "/" } else { trimmed };
        let trimmed = trimmed.to_string();
        url.set_path(&trimmed);
    }

    Ok(url)
}
