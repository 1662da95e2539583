//! Menuwatch core: pure decision logic of the menu pipeline, free of IO.
mod caption;
mod content;
mod dom;
mod keywords;
mod locate;
mod resolve;

pub use caption::{
    build_caption, date_from_url, monday_of, week_start, Caption, WeekSource, WeekStart,
};
pub use content::{decide_change, ChangeDecision, ContentHash, ImageContent};
pub use dom::MENU_KEYWORD;
pub use keywords::{
    KeywordScorer, Qualification, Verdict, DEFAULT_THRESHOLD, DEFAULT_VOCABULARY,
};
pub use locate::{locate_latest_post, post_links, LocatedPost, PostLink, SearchScope};
pub use resolve::{
    GenericArticleStrategy, ImageCandidate, ImageResolution, ImageResolver, ImageStrategy,
    PrimaryMarkerStrategy, StructuredFigureStrategy, Tier, PIN_MEDIA_ATTR,
};
