use menuwatch_core::{KeywordScorer, Qualification, Verdict};
use pretty_assertions::assert_eq;

fn init_logging() {
    menuwatch_logging::initialize_for_tests();
}

const OCR_TEXT: &str = "MONDAY\nLeek & potato Soup\nMain: roast of the day";

#[test]
fn three_hits_pass_a_threshold_of_one() {
    init_logging();
    let result = KeywordScorer::with_threshold(1).score(OCR_TEXT);
    assert!(result.confirmed);
    assert_eq!(
        result.matched.iter().map(String::as_str).collect::<Vec<_>>(),
        vec!["main", "monday", "soup"]
    );
    assert_eq!(
        result.verdict,
        Verdict::Scored {
            hits: 3,
            threshold: 1
        }
    );
}

#[test]
fn three_hits_fail_a_threshold_of_four() {
    init_logging();
    let result = KeywordScorer::with_threshold(4).score(OCR_TEXT);
    assert!(!result.confirmed);
    assert_eq!(result.matched.len(), 3);
}

#[test]
fn hits_must_strictly_exceed_threshold() {
    init_logging();
    let scorer = KeywordScorer::new(["soup", "salad"], 2);
    assert!(!scorer.score("soup and salad").confirmed);
    assert!(KeywordScorer::new(["soup", "salad"], 1)
        .score("Soup and Salad")
        .confirmed);
}

#[test]
fn currency_symbol_counts_as_keyword() {
    init_logging();
    let result = KeywordScorer::default().score("Lunch €7.50");
    assert!(result.matched.contains("€"));
    assert!(result.matched.contains("lunch"));
    assert!(result.confirmed);
}

#[test]
fn empty_text_is_unconfirmed() {
    init_logging();
    let result = KeywordScorer::default().score("");
    assert!(!result.confirmed);
    assert!(result.matched.is_empty());
}

#[test]
fn skipped_and_failed_results_differ_in_confirmation() {
    init_logging();
    assert!(Qualification::skipped().confirmed);
    let failed = Qualification::failed("decode error");
    assert!(!failed.confirmed);
    assert_eq!(
        failed.verdict,
        Verdict::Failed {
            reason: "decode error".to_string()
        }
    );
}
