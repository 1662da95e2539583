use scraper::{ElementRef, Selector};
use url::Url;

/// Keyword that marks both menu posts and menu images.
pub const MENU_KEYWORD: &str = "menu";

pub(crate) fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// Visible text of an element with whitespace runs collapsed to single spaces.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

pub(crate) fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn contains_keyword(haystack: &str, keyword: &str) -> bool {
    haystack.to_lowercase().contains(&keyword.to_lowercase())
}

/// Resolve an attribute value against `base`; absolute references are returned unchanged.
pub(crate) fn resolve_url(reference: &str, base: &Url) -> Option<Url> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with('#') || lower.starts_with("javascript:") || lower.starts_with("data:") {
        return None;
    }
    if let Ok(url) = Url::parse(trimmed) {
        return Some(url);
    }
    base.join(trimmed).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_references_resolve_against_base() {
        let base = Url::parse("https://example.com/blog/").unwrap();
        assert_eq!(
            resolve_url("/post/a", &base).unwrap().as_str(),
            "https://example.com/post/a"
        );
        assert_eq!(
            resolve_url("https://cdn.example.net/x.jpg", &base).unwrap().as_str(),
            "https://cdn.example.net/x.jpg"
        );
        assert!(resolve_url("  ", &base).is_none());
        assert!(resolve_url("#top", &base).is_none());
        assert!(resolve_url("data:image/png;base64,AAAA", &base).is_none());
    }

    #[test]
    fn keyword_match_ignores_case() {
        assert!(contains_keyword("Weekly MENU", MENU_KEYWORD));
        assert!(!contains_keyword("Chef special", MENU_KEYWORD));
    }

    #[test]
    fn whitespace_is_collapsed() {
        assert_eq!(collapse_whitespace("  a \n\t b  "), "a b");
    }
}
