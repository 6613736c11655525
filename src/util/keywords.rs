use std::collections::BTreeSet;

/// Normalized significant words of a title. Ordering is irrelevant, duplicates collapse.
pub type KeywordSet = BTreeSet<String>;

pub const DEFAULT_DUPLICATE_THRESHOLD: f32 = 0.5;

/// Words ignored during the overlap check: articles, prepositions and generic curriculum words.
pub const DEFAULT_STOP_WORDS: &[&str] = &[
    "a",
    "an",
    "the",
    "how",
    "to",
    "in",
    "on",
    "of",
    "for",
    "with",
    "and",
    "or",
    "is",
    "are",
    "basics",
    "essentials",
    "guide",
    "introduction",
    "mastering",
    "learning",
];

const MIN_KEYWORD_LEN: usize = 3;

#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    stop_words: BTreeSet<String>,
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::with_stop_words(DEFAULT_STOP_WORDS.iter().copied())
    }
}

impl KeywordExtractor {
    pub fn with_stop_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let stop_words = words
            .into_iter()
            .map(|word| word.as_ref().trim().to_lowercase())
            .filter(|word| !word.is_empty())
            .collect();
        Self { stop_words }
    }

    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }

    /// Lowercase the title, drop everything that is not an ASCII word character or
    /// whitespace, then keep tokens longer than two characters that are not stop words.
    pub fn extract(&self, title: &str) -> KeywordSet {
        let mut cleaned = String::with_capacity(title.len());
        for ch in title.chars() {
            for lower in ch.to_lowercase() {
                if lower.is_ascii_alphanumeric() || lower == '_' || lower.is_whitespace() {
                    cleaned.push(lower);
                }
            }
        }

        cleaned
            .split_whitespace()
            .filter(|token| token.len() >= MIN_KEYWORD_LEN && !self.is_stop_word(token))
            .map(|token| token.to_string())
            .collect()
    }
}

/// Share of the candidate's keywords that also appear in `seen`.
pub fn overlap_ratio(candidate: &KeywordSet, seen: &KeywordSet) -> f32 {
    let overlap = candidate.iter().filter(|word| seen.contains(*word)).count();
    overlap as f32 / candidate.len().max(1) as f32
}

#[derive(Debug, Clone, Copy)]
pub struct DuplicateDetector {
    threshold: f32,
}

impl Default for DuplicateDetector {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_DUPLICATE_THRESHOLD,
        }
    }
}

impl DuplicateDetector {
    pub fn new(threshold: f32) -> anyhow::Result<Self> {
        if !(threshold > 0.0 && threshold <= 1.0) {
            anyhow::bail!("duplicate threshold must be in (0, 1], got {threshold}");
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Index of the first seen set the candidate overlaps with at or above the threshold.
    /// Scanning stops at the first match, so the order of `seen` matters.
    pub fn find_duplicate<'a, I>(&self, candidate: &KeywordSet, seen: I) -> Option<usize>
    where
        I: IntoIterator<Item = &'a KeywordSet>,
    {
        seen.into_iter()
            .position(|set| overlap_ratio(candidate, set) >= self.threshold)
    }

    pub fn is_duplicate<'a, I>(&self, candidate: &KeywordSet, seen: I) -> bool
    where
        I: IntoIterator<Item = &'a KeywordSet>,
    {
        self.find_duplicate(candidate, seen).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(words: &[&str]) -> KeywordSet {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn extracts_significant_words() {
        let extractor = KeywordExtractor::default();
        assert_eq!(
            extractor.extract("Learning Woodworking Basics"),
            set(&["woodworking"])
        );
        assert_eq!(
            extractor.extract("Woodworking For Beginners"),
            set(&["woodworking", "beginners"])
        );
        assert_eq!(
            extractor.extract("Astrophysics Observation"),
            set(&["astrophysics", "observation"])
        );
    }

    #[test]
    fn strips_symbols_and_short_tokens() {
        let extractor = KeywordExtractor::default();
        let words = extractor.extract("  C++ & Rust: the *real* guide to AI, UX   ");
        assert_eq!(words, set(&["rust", "real"]));
    }

    #[test]
    fn symbols_inside_words_are_removed_not_split() {
        let extractor = KeywordExtractor::default();
        assert_eq!(extractor.extract("Don't re-invent"), set(&["dont", "reinvent"]));
        assert_eq!(extractor.extract("snake_case names"), set(&["snake_case", "names"]));
    }

    #[test]
    fn duplicate_tokens_collapse() {
        let extractor = KeywordExtractor::default();
        assert_eq!(
            extractor.extract("Pottery pottery POTTERY wheels"),
            set(&["pottery", "wheels"])
        );
    }

    #[test]
    fn empty_and_stopword_only_titles_yield_empty_sets() {
        let extractor = KeywordExtractor::default();
        assert!(extractor.extract("").is_empty());
        assert!(extractor.extract("   ").is_empty());
        assert!(extractor.extract("The Introduction to Mastering").is_empty());
    }

    #[test]
    fn every_keyword_is_long_and_not_a_stop_word() {
        let extractor = KeywordExtractor::default();
        let titles = [
            "How to Grow Tomatoes in a Small Apartment",
            "Essentials of Baroque Music: A Guide",
            "Is the Economy of Attention Broken?",
            "Écoles d'été and the art of étude",
        ];
        for title in titles {
            for word in extractor.extract(title) {
                assert!(word.len() > 2, "{word} too short");
                assert!(!DEFAULT_STOP_WORDS.contains(&word.as_str()), "{word} is a stop word");
            }
        }
    }

    #[test]
    fn extraction_is_idempotent() {
        let extractor = KeywordExtractor::default();
        let title = "Mastering the Forgotten History of Cartography";
        assert_eq!(extractor.extract(title), extractor.extract(title));
    }

    #[test]
    fn custom_stop_words_replace_the_defaults() {
        let extractor = KeywordExtractor::with_stop_words(["Rust", "cargo"]);
        assert_eq!(
            extractor.extract("Learning Rust with Cargo"),
            set(&["learning", "with"])
        );
    }

    #[test]
    fn ratio_stays_in_unit_interval() {
        let pairs = [
            (set(&[]), set(&["alpha"])),
            (set(&["alpha"]), set(&[])),
            (set(&["alpha", "beta"]), set(&["beta", "gamma", "delta"])),
            (set(&["alpha"]), set(&["alpha", "beta"])),
        ];
        for (candidate, seen) in pairs {
            let ratio = overlap_ratio(&candidate, &seen);
            assert!((0.0..=1.0).contains(&ratio));
        }
    }

    #[test]
    fn ratio_is_one_when_every_candidate_word_is_seen() {
        let candidate = set(&["woodworking"]);
        let seen = set(&["woodworking", "beginners"]);
        assert_eq!(overlap_ratio(&candidate, &seen), 1.0);
        assert_eq!(overlap_ratio(&seen, &candidate), 0.5);
    }

    #[test]
    fn empty_candidate_is_never_a_duplicate() {
        let detector = DuplicateDetector::default();
        let pool = vec![set(&["woodworking"]), set(&["astrophysics", "observation"])];
        assert!(!detector.is_duplicate(&set(&[]), &pool));
        assert!(!detector.is_duplicate(&set(&[]), &[set(&[])]));
    }

    #[test]
    fn threshold_is_inclusive() {
        let detector = DuplicateDetector::default();
        let pool = vec![set(&["woodworking", "tools"])];
        assert!(detector.is_duplicate(&set(&["woodworking", "beginners"]), &pool));
        assert!(!detector.is_duplicate(&set(&["woodworking", "beginners", "chairs"]), &pool));
    }

    #[test]
    fn first_match_wins_and_order_matters() {
        let detector = DuplicateDetector::new(0.5).unwrap();
        let a = set(&["baking", "bread"]);
        let b = set(&["baking", "sourdough", "starter"]);
        let candidate = set(&["sourdough", "starter", "baking"]);

        assert_eq!(detector.find_duplicate(&candidate, &[a.clone(), b.clone()]), Some(1));
        assert_eq!(detector.find_duplicate(&candidate, &[b.clone(), a.clone()]), Some(0));

        let strict = DuplicateDetector::new(0.6).unwrap();
        let narrow = set(&["bread", "baking"]);
        assert_eq!(strict.find_duplicate(&narrow, &[b.clone(), a.clone()]), Some(1));
        assert_eq!(strict.find_duplicate(&narrow, &[a, b]), Some(0));
    }

    #[test]
    fn rejects_out_of_range_thresholds() {
        assert!(DuplicateDetector::new(0.0).is_err());
        assert!(DuplicateDetector::new(1.5).is_err());
        assert!(DuplicateDetector::new(f32::NAN).is_err());
        assert_eq!(DuplicateDetector::new(1.0).unwrap().threshold(), 1.0);
    }
}
