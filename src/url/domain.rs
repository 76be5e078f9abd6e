use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use trawler::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Key under which robots.txt policies are cached: `scheme://host[:port]`
///
/// Two URLs share a robots.txt exactly when they share this key.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use trawler::url::origin_key;
///
/// let url = Url::parse("http://127.0.0.1:8080/a/b?c=d").unwrap();
/// assert_eq!(origin_key(&url), "http://127.0.0.1:8080");
/// ```
pub fn origin_key(url: &Url) -> String {
    url.origin().ascii_serialization()
}

/// Location of the robots.txt file governing `url`
pub fn robots_url(url: &Url) -> Option<Url> {
    url.join("/robots.txt").ok()
}
