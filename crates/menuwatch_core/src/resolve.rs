use scraper::{ElementRef, Html};
use url::Url;

use crate::dom::{collapse_whitespace, contains_keyword, resolve_url, selector, MENU_KEYWORD};

/// Rich-preview media attribute carried by the primary menu image.
pub const PIN_MEDIA_ATTR: &str = "data-pin-media";

const FIGURE_CONTAINERS: &str = "figure, [role=\"figure\"]";
const ARTICLE_CONTAINERS: &[&str] = &["article", "main", "[data-hook=\"post-content\"]", "body"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    PrimaryMarker,
    StructuredFigure,
    GenericArticle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCandidate {
    pub url: Url,
    pub alt: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub tier: Tier,
}

impl ImageCandidate {
    /// Declared `width * height`; a missing dimension counts as zero.
    pub fn declared_area(&self) -> u64 {
        u64::from(self.width.unwrap_or(0)) * u64::from(self.height.unwrap_or(0))
    }

    /// Non-empty alt text that does not mention the menu marks a decorative image.
    pub fn is_accepted(&self) -> bool {
        match self.alt.as_deref().map(str::trim) {
            Some(alt) if !alt.is_empty() => contains_keyword(alt, MENU_KEYWORD),
            _ => true,
        }
    }
}

/// One step of the image cascade.
pub trait ImageStrategy: Send + Sync {
    fn tier(&self) -> Tier;
    fn candidate(&self, doc: &Html, page_url: &Url) -> Option<ImageCandidate>;
}

/// First image carrying the rich-preview media attribute.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrimaryMarkerStrategy;

impl ImageStrategy for PrimaryMarkerStrategy {
    fn tier(&self) -> Tier {
        Tier::PrimaryMarker
    }

    fn candidate(&self, doc: &Html, page_url: &Url) -> Option<ImageCandidate> {
        let sel = selector(&format!("img[{PIN_MEDIA_ATTR}]"))?;
        doc.select(&sel).find_map(|img| {
            let url = resolve_url(img.value().attr(PIN_MEDIA_ATTR)?, page_url)?;
            Some(build_candidate(img, url, self.tier()))
        })
    }
}

/// First image inside the first figure-like container that has one.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredFigureStrategy;

impl ImageStrategy for StructuredFigureStrategy {
    fn tier(&self) -> Tier {
        Tier::StructuredFigure
    }

    fn candidate(&self, doc: &Html, page_url: &Url) -> Option<ImageCandidate> {
        let figure_sel = selector(FIGURE_CONTAINERS)?;
        let img_sel = selector("img")?;
        doc.select(&figure_sel).find_map(|figure| {
            let img = figure.select(&img_sel).next()?;
            let url = image_source(img, page_url)?;
            Some(build_candidate(img, url, self.tier()))
        })
    }
}

/// Largest declared image inside the main content container.
///
/// Ties keep document order, so a page without declared sizes yields its first image.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericArticleStrategy;

impl ImageStrategy for GenericArticleStrategy {
    fn tier(&self) -> Tier {
        Tier::GenericArticle
    }

    fn candidate(&self, doc: &Html, page_url: &Url) -> Option<ImageCandidate> {
        let container = ARTICLE_CONTAINERS.iter().find_map(|css| {
            let sel = selector(css)?;
            doc.select(&sel).next()
        })?;
        let img_sel = selector("img[src]")?;

        container
            .select(&img_sel)
            .filter_map(|img| {
                let url = resolve_url(img.value().attr("src")?, page_url)?;
                Some(build_candidate(img, url, self.tier()))
            })
            .fold(None, |best: Option<ImageCandidate>, candidate| match best {
                Some(best) if candidate.declared_area() <= best.declared_area() => Some(best),
                _ => Some(candidate),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImageResolution {
    pub chosen: Option<ImageCandidate>,
    pub rejected: Vec<ImageCandidate>,
}

/// Ordered cascade of image strategies; the first accepted candidate wins.
pub struct ImageResolver {
    strategies: Vec<Box<dyn ImageStrategy>>,
}

impl ImageResolver {
    pub fn new(strategies: Vec<Box<dyn ImageStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn tiers(&self) -> Vec<Tier> {
        self.strategies.iter().map(|s| s.tier()).collect()
    }

    pub fn resolve(&self, html: &str, page_url: &Url) -> ImageResolution {
        let doc = Html::parse_document(html);
        let mut resolution = ImageResolution::default();
        for strategy in &self.strategies {
            let Some(candidate) = strategy.candidate(&doc, page_url) else {
                continue;
            };
            if candidate.is_accepted() {
                resolution.chosen = Some(candidate);
                break;
            }
            resolution.rejected.push(candidate);
        }
        resolution
    }
}

impl Default for ImageResolver {
    fn default() -> Self {
        Self::new(vec![
            Box::new(PrimaryMarkerStrategy),
            Box::new(StructuredFigureStrategy),
            Box::new(GenericArticleStrategy),
        ])
    }
}

fn image_source(img: ElementRef<'_>, page_url: &Url) -> Option<Url> {
    ["src", "data-src", PIN_MEDIA_ATTR]
        .iter()
        .filter_map(|attr| img.value().attr(attr))
        .find_map(|value| resolve_url(value, page_url))
}

fn build_candidate(img: ElementRef<'_>, url: Url, tier: Tier) -> ImageCandidate {
    let attrs = img.value();
    ImageCandidate {
        url,
        alt: attrs
            .attr("alt")
            .map(collapse_whitespace)
            .filter(|alt| !alt.is_empty()),
        width: attrs.attr("width").and_then(parse_dimension),
        height: attrs.attr("height").and_then(parse_dimension),
        tier,
    }
}

/// Leading digits of a dimension attribute (`"1200"`, `"1200px"`).
fn parse_dimension(raw: &str) -> Option<u32> {
    let digits: String = raw.trim().chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}
