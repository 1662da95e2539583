use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::dom::{contains_keyword, element_text, resolve_url, selector, MENU_KEYWORD};

/// Structural markers of the feed container, most specific first.
const CONTAINER_MARKERS: &[&str] = &[
    "#pro-gallery-container",
    "[data-hook=\"pro-gallery\"]",
    "[data-hook=\"post-list\"]",
    "[class*=\"pro-gallery\"]",
    "[class*=\"gallery\"]",
];

/// Markers of a single feed item wrapping a post anchor.
const ITEM_MARKERS: &[&str] = &[
    "[data-hook=\"item-container\"]",
    "[data-hook=\"post-list-item\"]",
    "[class*=\"gallery-item\"]",
];

/// Path segment that precedes a post slug.
const POST_SEGMENT: &str = "post";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostLink {
    pub href: String,
    pub url: Url,
    pub text: String,
    pub container_text: Option<String>,
}

impl PostLink {
    pub fn mentions_menu(&self) -> bool {
        contains_keyword(&self.text, MENU_KEYWORD)
            || contains_keyword(&self.href, MENU_KEYWORD)
            || self
                .container_text
                .as_deref()
                .is_some_and(|text| contains_keyword(text, MENU_KEYWORD))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchScope {
    Container { marker: &'static str },
    WholePage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedPost {
    pub link: PostLink,
    pub scope: SearchScope,
}

/// Find the latest menu post on a listing page.
///
/// Document order is taken as recency: the first anchor that points at a post
/// and mentions the menu keyword wins. The feed container is searched first;
/// when it holds no menu anchor the whole page is scanned. Returns `None` when
/// no anchor survives.
pub fn locate_latest_post(html: &str, base: &Url) -> Option<LocatedPost> {
    let doc = Html::parse_document(html);
    let anchors = Anchors::new()?;

    if let Some((marker, container)) = find_container(&doc, base, &anchors) {
        if let Some(link) = anchors
            .post_links(container, base)
            .into_iter()
            .find(PostLink::mentions_menu)
        {
            return Some(LocatedPost {
                link,
                scope: SearchScope::Container { marker },
            });
        }
    }

    anchors
        .post_links(doc.root_element(), base)
        .into_iter()
        .find(PostLink::mentions_menu)
        .map(|link| LocatedPost {
            link,
            scope: SearchScope::WholePage,
        })
}

/// All anchors in scope whose target looks like a post, before keyword filtering.
pub fn post_links(html: &str, base: &Url) -> Vec<PostLink> {
    let doc = Html::parse_document(html);
    let Some(anchors) = Anchors::new() else {
        return Vec::new();
    };
    let root = find_container(&doc, base, &anchors)
        .map_or_else(|| doc.root_element(), |(_, container)| container);
    anchors.post_links(root, base)
}

/// Compiled selectors for anchors and feed items.
struct Anchors {
    anchor: Selector,
    items: Vec<Selector>,
}

impl Anchors {
    fn new() -> Option<Self> {
        Some(Self {
            anchor: selector("a[href]")?,
            items: ITEM_MARKERS.iter().filter_map(|m| selector(m)).collect(),
        })
    }

    fn post_links(&self, root: ElementRef<'_>, base: &Url) -> Vec<PostLink> {
        root.select(&self.anchor)
            .filter_map(|anchor| post_link(anchor, base, &self.items))
            .collect()
    }

    fn is_item(&self, element: &ElementRef<'_>) -> bool {
        self.items.iter().any(|sel| sel.matches(element))
    }

    fn holds_post(&self, element: ElementRef<'_>, base: &Url) -> bool {
        element.select(&self.anchor).any(|anchor| {
            anchor
                .value()
                .attr("href")
                .and_then(|href| resolve_url(href.trim(), base))
                .is_some_and(|url| is_post_path(&url))
        })
    }
}

/// First marked element that wraps the feed: not a single feed item, and
/// holding at least one post anchor.
fn find_container<'a>(
    doc: &'a Html,
    base: &Url,
    anchors: &Anchors,
) -> Option<(&'static str, ElementRef<'a>)> {
    CONTAINER_MARKERS.iter().find_map(|marker| {
        let sel = selector(marker)?;
        let found = doc
            .select(&sel)
            .find(|element| !anchors.is_item(element) && anchors.holds_post(*element, base));
        found.map(|element| (*marker, element))
    })
}

fn post_link(anchor: ElementRef<'_>, base: &Url, item_selectors: &[Selector]) -> Option<PostLink> {
    let href = anchor.value().attr("href")?.trim();
    let url = resolve_url(href, base)?;
    if !is_post_path(&url) {
        return None;
    }
    let container_text = nearest_item_container(anchor, item_selectors).map(element_text);
    Some(PostLink {
        href: href.to_string(),
        url,
        text: element_text(anchor),
        container_text,
    })
}

fn is_post_path(url: &Url) -> bool {
    let Some(segments) = url.path_segments() else {
        return false;
    };
    let segments: Vec<&str> = segments.collect();
    segments
        .windows(2)
        .any(|pair| pair[0].eq_ignore_ascii_case(POST_SEGMENT) && !pair[1].is_empty())
}

fn nearest_item_container<'a>(
    anchor: ElementRef<'a>,
    item_selectors: &[Selector],
) -> Option<ElementRef<'a>> {
    anchor
        .ancestors()
        .filter_map(as_element)
        .find(|element| item_selectors.iter().any(|sel| sel.matches(element)))
}

fn as_element(node: NodeRef<'_, Node>) -> Option<ElementRef<'_>> {
    ElementRef::wrap(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_path_requires_slug_after_post_segment() {
        let ok = Url::parse("https://example.com/post/menu-week-1").unwrap();
        let bare = Url::parse("https://example.com/post/").unwrap();
        let other = Url::parse("https://example.com/blog/menu").unwrap();
        assert!(is_post_path(&ok));
        assert!(!is_post_path(&bare));
        assert!(!is_post_path(&other));
    }
}
