use chrono::NaiveDate;
use menuwatch_core::{build_caption, date_from_url, monday_of, week_start, WeekSource};
use pretty_assertions::assert_eq;

fn init_logging() {
    menuwatch_logging::initialize_for_tests();
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn url_date_on_a_monday_is_its_own_week_start() {
    init_logging();
    let url = "https://www.example-dining.ie/post/weekly-menu-24-02-2025";
    let caption = build_caption(url, date(2025, 3, 12));
    assert_eq!(caption.text, "Menu for the week starting 24 Feb 2025");
    let week = caption.week.unwrap();
    assert_eq!(week.monday, date(2025, 2, 24));
    assert_eq!(week.source, WeekSource::PostUrl);

    // Deriving again gives the same answer.
    assert_eq!(build_caption(url, date(2025, 3, 12)), caption);
}

#[test]
fn midweek_url_date_rolls_back_to_monday() {
    init_logging();
    let week = week_start("/post/menu-27.02.2025", date(2030, 1, 1)).unwrap();
    assert_eq!(week.monday, date(2025, 2, 24));
}

#[test]
fn two_digit_years_are_in_this_century() {
    init_logging();
    assert_eq!(date_from_url("/post/menu_12_02_24"), Some(date(2024, 2, 12)));
}

#[test]
fn day_month_order_is_used() {
    init_logging();
    assert_eq!(
        date_from_url("/post/weekly-daily-menu-week-beginning-12-02-2024"),
        Some(date(2024, 2, 12))
    );
}

#[test]
fn invalid_or_missing_date_falls_back_to_run_week() {
    init_logging();
    let today = date(2025, 3, 13); // Thursday
    for url in ["/post/menu-31-02-2025", "/post/menu-week-1", "/post/2025-02-24"] {
        let week = week_start(url, today).unwrap();
        assert_eq!(week.monday, date(2025, 3, 10), "url {url}");
        assert_eq!(week.source, WeekSource::RunDate);
    }
    assert_eq!(
        build_caption("/post/menu-week-1", today).text,
        "Menu for the week starting 10 Mar 2025"
    );
}

#[test]
fn run_date_week_that_cannot_be_computed_degrades_to_this_week() {
    init_logging();
    let caption = build_caption("/post/menu", NaiveDate::MIN);
    assert_eq!(caption.text, "Menu for this week");
    assert!(caption.week.is_none());
}

#[test]
fn monday_of_sunday_is_previous_monday() {
    init_logging();
    assert_eq!(monday_of(date(2025, 3, 2)), Some(date(2025, 2, 24)));
}

#[test]
fn valid_token_after_an_invalid_one_is_found() {
    init_logging();
    assert_eq!(
        date_from_url("/post/menu-31-02-2025-03-03-2025"),
        Some(date(2025, 3, 3))
    );
    assert_eq!(date_from_url("/post/menu-124-02-2025"), None);
    assert_eq!(date_from_url("/post/menu-24-02-20251"), None);
}
