use crate::config::TtsConfig;
use crate::tts::{FeedbackVoice, TtsClient, VoiceError};
use crate::util::{retry_with_backoff, RetryPolicy};
use bytes::{Bytes, BytesMut};
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;

/// The endpoint rejects long utterances; feedback paragraphs are sent as
/// whitespace-split chunks and the MP3 segments concatenated.
const MAX_CHUNK_CHARS: usize = 200;

/// Client for the translate_tts endpoint.
#[derive(Clone)]
pub struct GoogleTtsClient {
    client: Client,
    endpoint: String,
    lang: String,
    retry: RetryPolicy,
}

impl GoogleTtsClient {
    pub fn new(config: &TtsConfig) -> Self {
        Self {
            client: Client::new(),
            endpoint: config.endpoint.to_string(),
            lang: config.lang.clone(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn chunk_text(text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();
        for word in text.split_whitespace() {
            if !current.is_empty() && current.len() + 1 + word.len() > MAX_CHUNK_CHARS {
                chunks.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        if !current.is_empty() {
            chunks.push(current);
        }
        chunks
    }

    async fn fetch_chunk(&self, chunk: &str, idx: usize, total: usize) -> Result<Bytes, VoiceError> {
        let idx = idx.to_string();
        let total = total.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", self.lang.as_str()),
                ("q", chunk),
                ("idx", idx.as_str()),
                ("total", total.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VoiceError::HttpStatus(status.as_u16(), body));
        }
        Ok(response.bytes().await?)
    }
}

impl TtsClient for GoogleTtsClient {
    fn synthesize(&self, text: String) -> BoxFuture<'_, Result<FeedbackVoice, VoiceError>> {
        let this = self.clone();
        async move {
            let chunks = Self::chunk_text(&text);
            if chunks.is_empty() {
                return Err(VoiceError::EmptyAudio);
            }

            let total = chunks.len();
            let mut mp3 = BytesMut::new();
            for (idx, chunk) in chunks.iter().enumerate() {
                let audio = retry_with_backoff(
                    &this.retry,
                    || this.fetch_chunk(chunk, idx, total),
                    VoiceError::is_retryable,
                )
                .await?;
                mp3.extend_from_slice(&audio);
            }

            if mp3.is_empty() {
                return Err(VoiceError::EmptyAudio);
            }
            Ok(FeedbackVoice { mp3: mp3.freeze() })
        }
        .boxed()
    }
}
