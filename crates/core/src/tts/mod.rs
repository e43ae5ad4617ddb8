mod google;

use bytes::Bytes;
use futures::future::BoxFuture;

pub use google::GoogleTtsClient;

/// Synthesized spoken feedback, MP3-encoded. An optional artifact: the text
/// report stands on its own when synthesis fails.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedbackVoice {
    pub mp3: Bytes,
}

#[derive(thiserror::Error, Debug)]
pub enum VoiceError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("http error {0}: {1}")]
    HttpStatus(u16, String),

    #[error("synthesis produced no audio")]
    EmptyAudio,
}

impl VoiceError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::HttpStatus(status, _) => crate::util::retryable_status(*status),
            Self::EmptyAudio => false,
        }
    }
}

/// Text-to-speech capability over the composed feedback.
pub trait TtsClient: Send + Sync {
    fn synthesize(&self, text: String) -> BoxFuture<'_, Result<FeedbackVoice, VoiceError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(VoiceError::HttpStatus(503, String::new()).is_retryable());
        assert!(VoiceError::HttpStatus(429, String::new()).is_retryable());
        assert!(!VoiceError::HttpStatus(400, String::new()).is_retryable());
        assert!(!VoiceError::EmptyAudio.is_retryable());
    }
}
