use serde::{Deserialize, Serialize};
use std::fmt;

// Canonical threshold set. The source material shipped several near-duplicate
// variants; these are the documented ones (see DESIGN.md) and the only ones
// used anywhere in this crate.
pub const PACE_SLOW_BELOW_WPM: f64 = 100.0;
pub const PACE_FAST_ABOVE_WPM: f64 = 160.0;
pub const SENTIMENT_POSITIVE_ABOVE: f64 = 0.1;
pub const SENTIMENT_NEGATIVE_BELOW: f64 = -0.1;
pub const EXPRESSIVE_GOOD_ABOVE: f64 = 0.25;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaceCategory {
    Slow,
    Good,
    Fast,
}

impl PaceCategory {
    /// Zero wpm means the clip duration was unknown; no pace judgement is
    /// made rather than reporting Slow.
    pub fn from_wpm(wpm: f64) -> Option<Self> {
        if wpm <= 0.0 {
            return None;
        }
        if wpm < PACE_SLOW_BELOW_WPM {
            Some(Self::Slow)
        } else if wpm > PACE_FAST_ABOVE_WPM {
            Some(Self::Fast)
        } else {
            Some(Self::Good)
        }
    }
}

impl fmt::Display for PaceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Slow => "too slow",
            Self::Good => "good pace",
            Self::Fast => "too fast",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum SentimentCategory {
    Negative,
    Neutral,
    Positive,
}

impl SentimentCategory {
    pub fn from_polarity(polarity: f64) -> Self {
        if polarity > SENTIMENT_POSITIVE_ABOVE {
            Self::Positive
        } else if polarity < SENTIMENT_NEGATIVE_BELOW {
            Self::Negative
        } else {
            Self::Neutral
        }
    }
}

impl fmt::Display for SentimentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Negative => "Negative",
            Self::Neutral => "Neutral",
            Self::Positive => "Positive",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ExpressivenessCategory {
    Low,
    Good,
}

impl ExpressivenessCategory {
    pub fn from_score(score: f64) -> Self {
        if score > EXPRESSIVE_GOOD_ABOVE {
            Self::Good
        } else {
            Self::Low
        }
    }
}

impl fmt::Display for ExpressivenessCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "Low",
            Self::Good => "Good",
        };
        f.write_str(s)
    }
}

/// Composite heuristic in [0, 1] blending word count and filler density;
/// only used to pick which phrase pool the composer leans on.
pub fn mood_score(word_count: usize, filler_count: usize) -> f64 {
    if word_count == 0 {
        return 0.4;
    }
    let denom = (word_count as f64 / 5.0).max(1.0);
    (1.0 - filler_count as f64 / denom).clamp(0.2, 0.9)
}
