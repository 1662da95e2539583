use std::sync::OnceLock;

use chrono::{Datelike, Duration, NaiveDate};
use regex::Regex;

/// `dd<sep>dd<sep>yyyy` or `dd<sep>dd<sep>yy`, day first.
const DATE_TOKEN: &str = r"([0-9]{2})[-._/]([0-9]{2})[-._/]([0-9]{4}|[0-9]{2})";

const CAPTION_DATE_FORMAT: &str = "%d %b %Y";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekSource {
    /// Date token embedded in the post URL.
    PostUrl,
    /// Week of the run date.
    RunDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekStart {
    pub monday: NaiveDate,
    pub source: WeekSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caption {
    pub text: String,
    pub week: Option<WeekStart>,
}

/// Monday on or before `date`.
pub fn monday_of(date: NaiveDate) -> Option<NaiveDate> {
    let offset = i64::from(date.weekday().num_days_from_monday());
    date.checked_sub_signed(Duration::days(offset))
}

/// First day-month-year token in `url` that forms a valid date.
///
/// A token must not be embedded in a longer run of digits. Every start
/// position is tried, so a token right after an invalid one is still found.
pub fn date_from_url(url: &str) -> Option<NaiveDate> {
    let token = date_token()?;
    let mut from = 0;
    while let Some(caps) = token.captures_at(url, from) {
        let whole = caps.get(0)?;
        if stands_alone(url, whole.start(), whole.end()) {
            if let Some(date) = token_date(&caps) {
                return Some(date);
            }
        }
        // Tokens start with an ASCII digit, so the next byte is a char boundary.
        from = whole.start() + 1;
    }
    None
}

fn stands_alone(text: &str, start: usize, end: usize) -> bool {
    let digit = |c: char| c.is_ascii_digit();
    !text[..start].ends_with(digit) && !text[end..].starts_with(digit)
}

fn token_date(caps: &regex::Captures<'_>) -> Option<NaiveDate> {
    let day: u32 = caps.get(1)?.as_str().parse().ok()?;
    let month: u32 = caps.get(2)?.as_str().parse().ok()?;
    let year_raw = caps.get(3)?.as_str();
    let mut year: i32 = year_raw.parse().ok()?;
    if year_raw.len() == 2 {
        year += 2000;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Week start for a post: the URL date when present and valid, else the run date.
pub fn week_start(post_url: &str, today: NaiveDate) -> Option<WeekStart> {
    if let Some(monday) = date_from_url(post_url).and_then(monday_of) {
        return Some(WeekStart {
            monday,
            source: WeekSource::PostUrl,
        });
    }
    monday_of(today).map(|monday| WeekStart {
        monday,
        source: WeekSource::RunDate,
    })
}

/// Caption naming the week the menu covers; degrades to "this week".
pub fn build_caption(post_url: &str, today: NaiveDate) -> Caption {
    match week_start(post_url, today) {
        Some(week) => Caption {
            text: format!(
                "Menu for the week starting {}",
                week.monday.format(CAPTION_DATE_FORMAT)
            ),
            week: Some(week),
        },
        None => Caption {
            text: "Menu for this week".to_string(),
            week: None,
        },
    }
}

fn date_token() -> Option<&'static Regex> {
    static TOKEN: OnceLock<Option<Regex>> = OnceLock::new();
    TOKEN.get_or_init(|| Regex::new(DATE_TOKEN).ok()).as_ref()
}
