use std::collections::BTreeSet;

/// Default menu vocabulary matched against recognized text.
pub const DEFAULT_VOCABULARY: &[&str] = &[
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
    "menu",
    "week",
    "soup",
    "main",
    "dessert",
    "salad",
    "starter",
    "vegetarian",
    "vegan",
    "breakfast",
    "lunch",
    "dinner",
    "special",
    "grill",
    "pasta",
    "chicken",
    "beef",
    "fish",
    "curry",
    "€",
];

/// Confirmation needs strictly more hits than this.
pub const DEFAULT_THRESHOLD: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// No text recognition available; confirmed without looking.
    Skipped,
    /// Text was recognized and scored.
    Scored { hits: usize, threshold: usize },
    /// Recognition failed; never confirmed.
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Qualification {
    pub confirmed: bool,
    pub matched: BTreeSet<String>,
    pub verdict: Verdict,
}

impl Qualification {
    pub fn skipped() -> Self {
        Self {
            confirmed: true,
            matched: BTreeSet::new(),
            verdict: Verdict::Skipped,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            confirmed: false,
            matched: BTreeSet::new(),
            verdict: Verdict::Failed {
                reason: reason.into(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordScorer {
    vocabulary: Vec<String>,
    threshold: usize,
}

impl KeywordScorer {
    pub fn new<I, S>(vocabulary: I, threshold: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            vocabulary: vocabulary
                .into_iter()
                .map(|word| word.into().to_lowercase())
                .filter(|word| !word.is_empty())
                .collect(),
            threshold,
        }
    }

    pub fn with_threshold(threshold: usize) -> Self {
        Self::new(DEFAULT_VOCABULARY.iter().copied(), threshold)
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Count vocabulary entries occurring as substrings of the lowercased text.
    pub fn score(&self, text: &str) -> Qualification {
        let text = text.to_lowercase();
        let matched: BTreeSet<String> = self
            .vocabulary
            .iter()
            .filter(|word| text.contains(word.as_str()))
            .cloned()
            .collect();
        let hits = matched.len();
        Qualification {
            confirmed: hits > self.threshold,
            matched,
            verdict: Verdict::Scored {
                hits,
                threshold: self.threshold,
            },
        }
    }
}

impl Default for KeywordScorer {
    fn default() -> Self {
        Self::with_threshold(DEFAULT_THRESHOLD)
    }
}
