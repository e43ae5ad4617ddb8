use crate::config::SttConfig;
use crate::media;
use crate::transcribe::{TranscribeError, Transcriber};
use bytes::Bytes;
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use serde::Deserialize;

const DEFAULT_LANG: &str = "en-US";

/// Client for the Google web speech endpoint. Audio goes up as raw l16
/// samples; the response is a stream of JSON lines of which usually only one
/// carries a result.
#[derive(Clone)]
pub struct GoogleSpeechTranscriber {
    client: Client,
    endpoint: String,
    api_key: String,
    lang: String,
}

#[derive(Deserialize)]
struct SpeechLine {
    #[serde(default)]
    result: Vec<SpeechResult>,
}

#[derive(Deserialize)]
struct SpeechResult {
    #[serde(default)]
    alternative: Vec<SpeechAlternative>,
}

#[derive(Deserialize)]
struct SpeechAlternative {
    #[serde(default)]
    transcript: String,
}

impl GoogleSpeechTranscriber {
    pub fn new(config: &SttConfig) -> Self {
        Self {
            client: Client::new(),
            endpoint: config.endpoint.to_string(),
            api_key: config.api_key.expose().to_owned(),
            lang: DEFAULT_LANG.to_owned(),
        }
    }

    pub fn with_lang(mut self, lang: String) -> Self {
        self.lang = lang;
        self
    }

    fn first_transcript(body: &str) -> String {
        for line in body.lines() {
            let Ok(parsed) = serde_json::from_str::<SpeechLine>(line) else {
                continue;
            };
            for result in parsed.result {
                if let Some(alt) = result.alternative.first() {
                    if !alt.transcript.trim().is_empty() {
                        return alt.transcript.trim().to_owned();
                    }
                }
            }
        }
        String::new()
    }
}

impl Transcriber for GoogleSpeechTranscriber {
    fn transcribe(&self, audio_wav: Bytes) -> BoxFuture<'_, Result<String, TranscribeError>> {
        let this = self.clone();
        async move {
            let info = media::parse_wav(&audio_wav).ok_or_else(|| {
                TranscribeError::UnusableAudio("not a RIFF/WAVE buffer".to_owned())
            })?;
            let pcm = info.pcm(&audio_wav).to_vec();
            if pcm.is_empty() {
                return Err(TranscribeError::UnusableAudio("empty pcm payload".to_owned()));
            }

            let response = this
                .client
                .post(&this.endpoint)
                .query(&[
                    ("client", "chromium"),
                    ("lang", this.lang.as_str()),
                    ("key", this.api_key.as_str()),
                ])
                .header(
                    "Content-Type",
                    format!("audio/l16; rate={}", info.sample_rate),
                )
                .body(pcm)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(TranscribeError::HttpStatus(status.as_u16(), body));
            }

            let body = response.text().await?;
            Ok(Self::first_transcript(&body))
        }
        .boxed()
    }
}
