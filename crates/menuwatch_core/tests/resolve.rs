use menuwatch_core::{
    GenericArticleStrategy, ImageResolver, ImageStrategy, PrimaryMarkerStrategy,
    StructuredFigureStrategy, Tier,
};
use pretty_assertions::assert_eq;
use scraper::Html;
use url::Url;

fn init_logging() {
    menuwatch_logging::initialize_for_tests();
}

fn post_url() -> Url {
    Url::parse("https://www.example-dining.ie/post/weekly-menu-24-02-2025").unwrap()
}

#[test]
fn primary_marker_wins_over_figure_when_accepted() {
    init_logging();
    let html = r#"
    <article>
        <img data-pin-media="https://static.example.net/menu-primary.jpg" alt="Weekly menu">
        <figure><img src="/media/figure.jpg"></figure>
    </article>"#;

    let resolution = ImageResolver::default().resolve(html, &post_url());
    let chosen = resolution.chosen.expect("image");
    assert_eq!(chosen.tier, Tier::PrimaryMarker);
    assert_eq!(chosen.url.as_str(), "https://static.example.net/menu-primary.jpg");
    assert!(resolution.rejected.is_empty());
}

#[test]
fn unrelated_alt_text_falls_through_to_figure_tier() {
    init_logging();
    let html = r#"
    <article>
        <img data-pin-media="https://static.example.net/chef.jpg" alt="chef special">
        <figure><img src="/media/menu-scan.jpg" alt=""></figure>
    </article>"#;

    let resolution = ImageResolver::default().resolve(html, &post_url());
    let chosen = resolution.chosen.expect("image");
    assert_eq!(chosen.tier, Tier::StructuredFigure);
    assert_eq!(
        chosen.url.as_str(),
        "https://www.example-dining.ie/media/menu-scan.jpg"
    );
    assert_eq!(resolution.rejected.len(), 1);
    assert_eq!(resolution.rejected[0].tier, Tier::PrimaryMarker);
}

#[test]
fn missing_alt_text_is_never_a_reason_to_reject() {
    init_logging();
    let html = r#"<img data-pin-media="https://static.example.net/a.jpg">"#;
    let chosen = ImageResolver::default()
        .resolve(html, &post_url())
        .chosen
        .expect("image");
    assert_eq!(chosen.alt, None);
    assert!(chosen.is_accepted());
}

#[test]
fn figure_located_by_role_attribute() {
    init_logging();
    let doc = Html::parse_document(
        r#"<div role="figure"><span><img data-src="lazy/menu.png"></span></div>"#,
    );
    let candidate = StructuredFigureStrategy
        .candidate(&doc, &post_url())
        .expect("figure image");
    assert_eq!(
        candidate.url.as_str(),
        "https://www.example-dining.ie/post/lazy/menu.png"
    );
}

#[test]
fn article_tier_picks_largest_declared_area() {
    init_logging();
    let doc = Html::parse_document(
        r#"
    <nav><img src="/logo.png" width="2000" height="2000"></nav>
    <article>
        <img src="/small.jpg" width="100" height="100">
        <img src="/unsized.jpg">
        <img src="/large.jpg" width="1200" height="1600">
    </article>"#,
    );
    let candidate = GenericArticleStrategy
        .candidate(&doc, &post_url())
        .expect("article image");
    assert_eq!(candidate.url.path(), "/large.jpg");
    assert_eq!(candidate.declared_area(), 1200 * 1600);
}

#[test]
fn article_tier_takes_first_image_without_dimensions() {
    init_logging();
    let doc = Html::parse_document(
        r#"<main><img src="/first.jpg"><img src="/second.jpg"></main>"#,
    );
    let candidate = GenericArticleStrategy
        .candidate(&doc, &post_url())
        .expect("article image");
    assert_eq!(candidate.url.path(), "/first.jpg");
}

#[test]
fn rejected_everywhere_yields_no_image() {
    init_logging();
    let html = r#"
    <article>
        <img data-pin-media="/a.jpg" alt="dining room">
        <figure><img src="/b.jpg" alt="staff photo"></figure>
    </article>"#;

    let resolution = ImageResolver::default().resolve(html, &post_url());
    assert!(resolution.chosen.is_none());
    // The pin image has no src, so the article tier only sees the figure image again.
    assert_eq!(
        resolution
            .rejected
            .iter()
            .map(|c| c.tier)
            .collect::<Vec<_>>(),
        vec![
            Tier::PrimaryMarker,
            Tier::StructuredFigure,
            Tier::GenericArticle
        ]
    );
}

#[test]
fn custom_cascade_respects_given_order() {
    init_logging();
    let resolver = ImageResolver::new(vec![
        Box::new(GenericArticleStrategy),
        Box::new(PrimaryMarkerStrategy),
    ]);
    assert_eq!(
        resolver.tiers(),
        vec![Tier::GenericArticle, Tier::PrimaryMarker]
    );

    let html = r#"<article><img src="/plain.jpg"><img data-pin-media="/pin.jpg"></article>"#;
    let chosen = resolver.resolve(html, &post_url()).chosen.expect("image");
    assert_eq!(chosen.tier, Tier::GenericArticle);
    assert_eq!(chosen.url.path(), "/plain.jpg");
}
