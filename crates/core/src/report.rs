use crate::affect::AffectMetrics;
use crate::category::{ExpressivenessCategory, PaceCategory, SentimentCategory};
use crate::lexical::LexicalMetrics;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportCategories {
    /// Absent when the clip duration was unknown.
    pub pace: Option<PaceCategory>,
    pub sentiment: SentimentCategory,
    /// Absent when no sampled frame produced a valid mouth geometry.
    pub expressiveness: Option<ExpressivenessCategory>,
}

/// The sole externally visible artifact of one analysis request. Write-once;
/// rendering never mutates it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FeedbackReport {
    pub generated_at: DateTime<Utc>,
    pub speaker: String,
    pub transcript: String,
    pub lexical: LexicalMetrics,
    pub affect: AffectMetrics,
    pub mood_score: f64,
    pub categories: ReportCategories,
    pub composed_text: String,
    pub suggestions: Vec<String>,
}

impl FeedbackReport {
    /// Plain-text rendering in fixed order: timestamp, speaker, transcript,
    /// metrics, feedback. Unknown pace and expressiveness are omitted, not
    /// printed as zeros.
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        out.push_str("Human Analytics Report\n");
        out.push_str(&format!(
            "Timestamp (UTC): {}\n",
            self.generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        ));
        out.push_str(&format!("Speaker: {}\n", self.speaker));

        out.push_str("\nTranscript:\n");
        out.push_str(&self.transcript);
        out.push('\n');

        out.push_str("\nQuick metrics:\n");
        out.push_str(&format!("Words: {}\n", self.lexical.word_count));
        out.push_str(&format!("Filler words: {}\n", self.lexical.filler_count));
        if let Some(pace) = self.categories.pace {
            out.push_str(&format!(
                "Pace: {:.0} wpm ({pace})\n",
                self.lexical.words_per_minute
            ));
        }
        out.push_str(&format!(
            "Sentiment: {} (polarity {:.2})\n",
            self.categories.sentiment, self.affect.sentiment_polarity
        ));
        if let (Some(score), Some(category)) =
            (self.affect.expressiveness, self.categories.expressiveness)
        {
            out.push_str(&format!("Expressiveness: {score:.3} ({category})\n"));
        }
        out.push_str(&format!("Mood score: {:.2}\n", self.mood_score));

        out.push_str("\nFeedback:\n");
        out.push_str(&self.composed_text);
        out.push('\n');

        if !self.suggestions.is_empty() {
            out.push_str("\nSuggestions:\n");
            for suggestion in &self.suggestions {
                out.push_str(&format!("- {suggestion}\n"));
            }
        }

        out
    }
}
