use crate::UrlError;
use url::Url;

/// Query parameters that only carry tracking state
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid", "igshid", "ref_src"];

/// Normalizes a URL so equal resources compare equal in the frontier
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Accept only `http` and `https`; require a host
/// 3. Lowercase the host
/// 4. Normalize the path: remove dot segments and empty segments,
///    keep a trailing slash, empty path becomes `/`
/// 5. Remove the fragment
/// 6. Remove tracking query parameters, sort the rest, drop an empty query
/// 7. Reject the result if it is longer than `max_len` characters
///
/// # Examples
///
/// ```
/// use trawler::url::normalize_url;
///
/// let url = normalize_url("http://EXAMPLE.com/a/../news/?utm_source=x#top", 120).unwrap();
/// assert_eq!(url.as_str(), "http://example.com/news/");
/// ```
pub fn normalize_url(url_str: &str, max_len: usize) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    normalize_parsed(url, max_len)
}

/// Same as [`normalize_url`] for an already parsed URL
pub fn normalize_parsed(mut url: Url, max_len: usize) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or(UrlError::MissingHost)?
        .to_lowercase();
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;

    let path = normalize_path(url.path());
    url.set_path(&path);

    url.set_fragment(None);

    if let Some(query) = url.query() {
        let query = filter_and_sort_query(query);
        url.set_query(query.as_deref());
    }

    let len = url.as_str().len();
    if len > max_len {
        return Err(UrlError::TooLong { len, max: max_len });
    }

    Ok(url)
}

/// Removes dot segments and repeated slashes from a URL path
fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() {
        return "/".to_string();
    }

    let mut result = format!("/{}", segments.join("/"));
    if path.ends_with('/') {
        result.push('/');
    }
    result
}

/// Drops tracking parameters and sorts the rest by key
///
/// Segments are kept byte for byte, so a bare flag stays bare and encoded
/// characters are not re-encoded. `None` when nothing survives.
fn filter_and_sort_query(query: &str) -> Option<String> {
    let mut segments: Vec<&str> = query
        .split('&')
        .filter(|segment| !segment.is_empty())
        .filter(|segment| !is_tracking_param(query_key(segment)))
        .collect();

    if segments.is_empty() {
        return None;
    }
    segments.sort_by_key(|segment| query_key(segment));
    Some(segments.join("&"))
}

fn query_key(segment: &str) -> &str {
    segment.split_once('=').map_or(segment, |(key, _)| key)
}

fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: usize = 120;

    #[test]
    fn test_scheme_is_preserved() {
        let result = normalize_url("http://example.com/page", MAX).unwrap();
        assert_eq!(result.as_str(), "http://example.com/page");
    }

    #[test]
    fn test_keep_trailing_slash() {
        let result = normalize_url("https://example.com/page/", MAX).unwrap();
        assert_eq!(result.as_str(), "https://example.com/page/");
    }

    #[test]
    fn test_remove_fragment() {
        let result = normalize_url("https://example.com/page#section", MAX).unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_remove_tracking_params() {
        let result = normalize_url("https://example.com/page?utm_source=twitter", MAX).unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_sort_query_params() {
        let result = normalize_url("https://example.com/page?b=2&a=1&fbclid=9", MAX).unwrap();
        assert_eq!(result.as_str(), "https://example.com/page?a=1&b=2");
    }

    #[test]
    fn test_query_segments_are_kept_verbatim() {
        let flag = normalize_url("http://x.test/search?q", MAX).unwrap();
        assert_eq!(flag.as_str(), "http://x.test/search?q");

        let encoded =
            normalize_url("http://x.test/s?path=/a/b&q=hello%20world&fbclid=1", MAX).unwrap();
        assert_eq!(encoded.as_str(), "http://x.test/s?path=/a/b&q=hello%20world");

        let plus = normalize_url("http://x.test/s?q=a+b", MAX).unwrap();
        assert_eq!(plus.as_str(), "http://x.test/s?q=a+b");
    }

    #[test]
    fn test_empty_query_is_dropped() {
        let result = normalize_url("http://x.test/page?", MAX).unwrap();
        assert_eq!(result.as_str(), "http://x.test/page");

        let result = normalize_url("http://x.test/page?&&utm_medium=mail", MAX).unwrap();
        assert_eq!(result.as_str(), "http://x.test/page");
    }

    #[test]
    fn test_equal_keys_keep_their_order() {
        let result = normalize_url("http://x.test/p?tag=b&id=1&tag=a", MAX).unwrap();
        assert_eq!(result.as_str(), "http://x.test/p?id=1&tag=b&tag=a");
    }

    #[test]
    fn test_normalize_path_with_dots() {
        let result = normalize_url("https://example.com/a/../b/./c", MAX).unwrap();
        assert_eq!(result.as_str(), "https://example.com/b/c");
    }

    #[test]
    fn test_lowercase_host_only() {
        let result = normalize_url("https://EXAMPLE.COM/Page", MAX).unwrap();
        assert_eq!(result.as_str(), "https://example.com/Page");
    }

    #[test]
    fn test_port_is_kept() {
        let result = normalize_url("http://127.0.0.1:4000/index", MAX).unwrap();
        assert_eq!(result.as_str(), "http://127.0.0.1:4000/index");
    }

    #[test]
    fn test_multiple_slashes() {
        let result = normalize_url("https://example.com///path//to///page", MAX).unwrap();
        assert_eq!(result.as_str(), "https://example.com/path/to/page");
    }

    #[test]
    fn test_empty_path_becomes_root() {
        let result = normalize_url("https://example.com", MAX).unwrap();
        assert_eq!(result.as_str(), "https://example.com/");
    }

    #[test]
    fn test_invalid_scheme() {
        let result = normalize_url("ftp://example.com/page", MAX);
        assert!(matches!(result, Err(UrlError::InvalidScheme(_))));
    }

    #[test]
    fn test_malformed_url() {
        assert!(matches!(
            normalize_url("not a url", MAX),
            Err(UrlError::Parse(_))
        ));
    }

    #[test]
    fn test_too_long() {
        let url = format!("https://example.com/{}", "x".repeat(150));
        assert!(matches!(
            normalize_url(&url, MAX),
            Err(UrlError::TooLong { max: 120, .. })
        ));
    }

    #[test]
    fn test_length_is_checked_after_normalization() {
        // Tracking junk pushes the raw string over the limit; the normalized form fits
        let url = format!("https://example.com/page?utm_campaign={}", "y".repeat(150));
        let result = normalize_url(&url, MAX).unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }
}
