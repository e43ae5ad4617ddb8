use crate::affect::{SentimentError, SentimentScorer};
use futures::future::BoxFuture;
use futures::FutureExt;

const POSITIVE_WORDS: [&str; 18] = [
    "good", "great", "excellent", "happy", "joy", "love", "nice", "confident", "clear",
    "amazing", "wonderful", "strong", "positive", "best", "enjoy", "excited", "well",
    "fantastic",
];

const NEGATIVE_WORDS: [&str; 18] = [
    "bad", "terrible", "awful", "sad", "hate", "poor", "weak", "nervous", "unclear",
    "boring", "worst", "negative", "wrong", "difficult", "problem", "fail", "angry",
    "horrible",
];

/// Word-list polarity scorer standing in for an external sentiment engine.
/// Polarity is the signed share of affect-bearing words, so it lands in
/// [-1, 1] by construction and is deterministic for a given string.
#[derive(Clone, Debug, Default)]
pub struct LexiconSentimentScorer;

impl LexiconSentimentScorer {
    pub fn new() -> Self {
        Self
    }

    fn polarity(text: &str) -> f64 {
        let lowered = text.to_lowercase();
        let mut positive = 0usize;
        let mut negative = 0usize;
        for token in lowered.split(|c: char| !c.is_alphanumeric()) {
            if token.is_empty() {
                continue;
            }
            if POSITIVE_WORDS.contains(&token) {
                positive += 1;
            } else if NEGATIVE_WORDS.contains(&token) {
                negative += 1;
            }
        }
        let hits = positive + negative;
        if hits == 0 {
            return 0.0;
        }
        ((positive as f64 - negative as f64) / hits as f64).clamp(-1.0, 1.0)
    }
}

impl SentimentScorer for LexiconSentimentScorer {
    fn score(&self, text: String) -> BoxFuture<'_, Result<f64, SentimentError>> {
        async move { Ok(Self::polarity(&text)) }.boxed()
    }
}
