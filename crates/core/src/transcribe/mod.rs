mod google;

use bytes::Bytes;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use google::GoogleSpeechTranscriber;

/// Shown in the report when the speech service produced nothing usable. The
/// degraded transcript is display-only; lexical metrics are computed from the
/// raw (empty) text.
pub const TRANSCRIBE_FALLBACK_TEXT: &str = "Could not transcribe audio clearly.";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TranscriptionResult {
    pub text: String,
    pub source_duration: Duration,
}

impl TranscriptionResult {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// The transcript as the report shows it: the sentinel when empty.
    pub fn display_text(&self) -> &str {
        if self.is_empty() {
            TRANSCRIBE_FALLBACK_TEXT
        } else {
            &self.text
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum TranscribeError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("http error {0}: {1}")]
    HttpStatus(u16, String),

    #[error("unusable speech payload: {0}")]
    UnusableAudio(String),
}

/// Speech-to-text capability. Implementations return the recognized text,
/// possibly empty when nothing was decodable; the pipeline maps both errors
/// and emptiness to the degraded-transcript path.
pub trait Transcriber: Send + Sync {
    fn transcribe(&self, audio_wav: Bytes) -> BoxFuture<'_, Result<String, TranscribeError>>;
}
