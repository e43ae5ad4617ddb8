mod face;
mod lexicon;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

pub use face::{
    expressiveness_ratio, mean_expressiveness, FaceError, FaceLandmarker, MouthLandmarks,
    NullFaceLandmarker, Point,
};
pub use lexicon::LexiconSentimentScorer;

/// Affect-side metrics for one clip. Expressiveness is `None` when no sampled
/// frame produced a valid mouth geometry; "no data" is never conflated with a
/// numeric low score.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct AffectMetrics {
    pub sentiment_polarity: f64,
    pub expressiveness: Option<f64>,
}

#[derive(thiserror::Error, Debug)]
pub enum SentimentError {
    #[error("sentiment analysis failed: {0}")]
    AnalysisFailed(String),
}

/// Sentiment capability: text in, polarity in [-1, 1] out. Deterministic for
/// a given string and scorer version. Failures are recovered by the pipeline
/// with a neutral 0.0.
pub trait SentimentScorer: Send + Sync {
    fn score(&self, text: String) -> BoxFuture<'_, Result<f64, SentimentError>>;
}
