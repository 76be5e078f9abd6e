/// Returns the first needle contained in `haystack`, ignoring ASCII case
///
/// Needles are expected in lowercase (keywords and ignore entries are
/// normalized on load).
///
/// # Examples
///
/// ```
/// use trawler::url::first_substring_match;
///
/// let keywords = vec!["gaming".to_string(), "esports".to_string()];
/// assert_eq!(
///     first_substring_match("https://site.com/Gaming-News", &keywords),
///     Some("gaming")
/// );
/// assert_eq!(first_substring_match("https://site.com/weather", &keywords), None);
/// ```
pub fn first_substring_match<'a>(haystack: &str, needles: &'a [String]) -> Option<&'a str> {
    let haystack = haystack.to_ascii_lowercase();
    needles
        .iter()
        .map(String::as_str)
        .find(|needle| !needle.is_empty() && haystack.contains(needle))
}

/// Returns true if `haystack` contains any of the needles, ignoring ASCII case
pub fn contains_any(haystack: &str, needles: &[String]) -> bool {
    first_substring_match(haystack, needles).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_substring_match() {
        let ignore = list(&["youtube", "twitter"]);
        assert!(contains_any("https://www.youtube.com/watch?v=1", &ignore));
        assert!(contains_any("https://twitter.com/someone", &ignore));
        assert!(!contains_any("https://kotaku.com/", &ignore));
    }

    #[test]
    fn test_case_insensitive() {
        let ignore = list(&["adtrack"]);
        assert!(contains_any("http://AdTrack.example/x", &ignore));
    }

    #[test]
    fn test_empty_needles_never_match() {
        assert!(!contains_any("https://example.com/", &[]));
        assert!(!contains_any("https://example.com/", &list(&[""])));
    }

    #[test]
    fn test_first_match_follows_list_order() {
        let keywords = list(&["news", "gaming"]);
        assert_eq!(
            first_substring_match("https://site.com/gaming-news", &keywords),
            Some("news")
        );
    }
}
