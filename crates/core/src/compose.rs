use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Transcripts shorter than this get the abbreviated feedback form.
pub const SHORT_TRANSCRIPT_WORDS: usize = 8;

/// Mood at or above this draws from the positive pool first.
pub const POSITIVE_LEANING_MOOD: f64 = 0.5;

pub const POSITIVE_PHRASES: [&str; 5] = [
    "Great delivery — your pace felt natural and easy to follow.",
    "Nice clarity — your words came across clearly and confidently.",
    "Good energy — you sounded engaged and present.",
    "Strong vocabulary — your word choice was appropriate and effective.",
    "Clear openings and closings — good structure in your speech.",
];

pub const NEGATIVE_PHRASES: [&str; 5] = [
    "Try slowing down a bit — a calmer pace will improve clarity.",
    "You used some filler words (like 'um' and 'so') — try to reduce them.",
    "Work on voice modulation — the tone was a bit flat in parts.",
    "Some words were unclear — focus on crisp pronunciation for tricky words.",
    "Add a touch more energy at key moments to keep the audience engaged.",
];

pub const GRAMMAR_TIPS: [&str; 3] = [
    "Watch verb tenses — keep them consistent across sentences.",
    "Break long sentences into two for better clarity.",
    "Use active voice when possible to make sentences stronger.",
];

pub const PRONUNCIATION_TIPS: [&str; 3] = [
    "Practice the pronunciation of multi-syllable words slowly.",
    "Record and match your pronunciation to native examples.",
    "Control your mouth openings on long vowel sounds.",
];

pub const ACTIONABLE_TIPS: [&str; 3] = [
    "Try a short daily practice: read 2 minutes aloud and record once a day.",
    "Use pauses intentionally — count a silent 1–2 seconds between ideas.",
    "Practice tongue twisters to improve articulation and clarity.",
];

pub const CLOSING_SUMMARY: &str =
    "Overall, you're on the right path — a few focused practices will make your delivery stand out.";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComposedFeedback {
    pub text: String,
    pub suggestions: Vec<String>,
}

/// Assembles the human-readable feedback paragraph. All randomness in the
/// pipeline lives here, behind an injectable seed, so identical metrics plus
/// an identical seed reproduce the exact paragraph.
pub struct FeedbackComposer {
    rng: StdRng,
}

impl FeedbackComposer {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn pick(&mut self, pool: &[&'static str]) -> &'static str {
        pool[self.rng.random_range(0..pool.len())]
    }

    fn pick_two_distinct(&mut self, pool: &[&'static str]) -> (&'static str, &'static str) {
        let picks = sample(&mut self.rng, pool.len(), 2);
        (pool[picks.index(0)], pool[picks.index(1)])
    }

    pub fn compose(&mut self, word_count: usize, mood_score: f64) -> ComposedFeedback {
        if word_count < SHORT_TRANSCRIPT_WORDS {
            // Very short transcripts get visibly shorter feedback: one phrase
            // from the combined pools plus a single practice tip.
            let union: Vec<&'static str> = POSITIVE_PHRASES
                .iter()
                .chain(NEGATIVE_PHRASES.iter())
                .copied()
                .collect();
            let phrase = self.pick(&union);
            let tip = self.pick(&ACTIONABLE_TIPS);
            return ComposedFeedback {
                text: format!("{phrase} {tip}"),
                suggestions: vec![tip.to_owned()],
            };
        }

        let mut parts: Vec<String> = Vec::new();
        if mood_score >= POSITIVE_LEANING_MOOD {
            let (a, b) = self.pick_two_distinct(&POSITIVE_PHRASES);
            parts.push(a.to_owned());
            parts.push(b.to_owned());
            parts.push(format!("One quick note: {}", self.pick(&NEGATIVE_PHRASES)));
        } else {
            let (a, b) = self.pick_two_distinct(&NEGATIVE_PHRASES);
            parts.push(a.to_owned());
            parts.push(b.to_owned());
            parts.push(format!("A strength: {}", self.pick(&POSITIVE_PHRASES)));
        }

        let grammar = self.pick(&GRAMMAR_TIPS);
        let pronunciation = self.pick(&PRONUNCIATION_TIPS);
        let action = self.pick(&ACTIONABLE_TIPS);
        parts.push(format!("Grammar suggestion: {grammar}"));
        parts.push(format!("Pronunciation suggestion: {pronunciation}"));
        parts.push(format!("Practice tip: {action}"));
        parts.push(CLOSING_SUMMARY.to_owned());

        ComposedFeedback {
            text: parts.join(" "),
            suggestions: vec![grammar.to_owned(), pronunciation.to_owned(), action.to_owned()],
        }
    }
}

impl Default for FeedbackComposer {
    fn default() -> Self {
        Self::new()
    }
}
