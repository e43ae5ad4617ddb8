use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Canonical filler list. Entries are matched as case-insensitive substrings,
/// not tokens, so a phrase entry containing a shorter entry double-counts.
/// Kept that way for compatibility with existing reports.
pub const FILLER_WORDS: [&str; 8] = [
    "um",
    "uh",
    "like",
    "so",
    "actually",
    "basically",
    "you know",
    "right",
];

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct LexicalMetrics {
    pub word_count: usize,
    pub filler_count: usize,
    pub words_per_minute: f64,
}

impl LexicalMetrics {
    pub fn from_transcript(text: &str, duration: Duration) -> Self {
        let word_count = word_count(text);
        let filler_count = filler_count(text);
        let secs = duration.as_secs_f64();
        let words_per_minute = if secs > 0.0 {
            word_count as f64 / secs * 60.0
        } else {
            0.0
        };
        Self {
            word_count,
            filler_count,
            words_per_minute,
        }
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

pub fn filler_count(text: &str) -> usize {
    let lowered = text.to_lowercase();
    FILLER_WORDS
        .iter()
        .map(|filler| substring_occurrences(&lowered, filler))
        .sum()
}

/// Non-overlapping substring occurrence count.
fn substring_occurrences(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    let mut count = 0;
    let mut rest = haystack;
    while let Some(at) = rest.find(needle) {
        count += 1;
        rest = &rest[at + needle.len()..];
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_transcript_is_all_zero() {
        let m = LexicalMetrics::from_transcript("", Duration::from_secs(30));
        assert_eq!(m.word_count, 0);
        assert_eq!(m.filler_count, 0);
        assert_eq!(m.words_per_minute, 0.0);
    }

    #[test]
    fn wpm_zero_for_unknown_duration() {
        let m = LexicalMetrics::from_transcript("one two three", Duration::ZERO);
        assert_eq!(m.word_count, 3);
        assert_eq!(m.words_per_minute, 0.0);
    }

    #[test]
    fn nine_words_over_a_minute() {
        let m = LexicalMetrics::from_transcript(
            "um so basically I think um this is great",
            Duration::from_secs(60),
        );
        assert_eq!(m.word_count, 9);
        assert_eq!(m.filler_count, 4);
        assert!((m.words_per_minute - 9.0).abs() < 1e-9);
    }

    #[test]
    fn fillers_counted_as_substrings() {
        // "so" inside "sofa" still counts, as does a capitalized filler
        assert_eq!(filler_count("the sofa is nice"), 1);
        assert_eq!(filler_count("Um, right."), 2);
        assert_eq!(filler_count("you know you know"), 2);
    }

    #[test]
    fn filler_count_monotone_under_appends() {
        let base = "well this talk went fine";
        let before = filler_count(base);
        let after = filler_count(&format!("{base} um uh like"));
        assert!(after >= before);
        assert_eq!(after, before + 3);
    }

    #[test]
    fn substring_occurrences_non_overlapping() {
        assert_eq!(substring_occurrences("aaaa", "aa"), 2);
        assert_eq!(substring_occurrences("ababab", "aba"), 1);
        assert_eq!(substring_occurrences("no hits here", "zz"), 0);
    }
}
