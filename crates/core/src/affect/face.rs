use crate::demux::VideoFrame;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// The four mouth points an external landmark detector reports per face.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct MouthLandmarks {
    pub left_corner: Point,
    pub right_corner: Point,
    pub upper_lip: Point,
    pub lower_lip: Point,
}

#[derive(thiserror::Error, Debug)]
pub enum FaceError {
    #[error("landmark detection failed: {0}")]
    DetectionFailed(String),
}

/// Facial-landmark capability. `Ok(None)` means no face in the frame; errors
/// are treated the same way by the caller (the frame is skipped).
pub trait FaceLandmarker: Send + Sync {
    fn landmarks(
        &self,
        frame: VideoFrame,
    ) -> BoxFuture<'_, Result<Option<MouthLandmarks>, FaceError>>;
}

/// Detector that never finds a face, for deployments without a landmark
/// backend. Expressiveness then stays unknown rather than defaulting low.
#[derive(Clone, Debug, Default)]
pub struct NullFaceLandmarker;

impl FaceLandmarker for NullFaceLandmarker {
    fn landmarks(
        &self,
        _frame: VideoFrame,
    ) -> BoxFuture<'_, Result<Option<MouthLandmarks>, FaceError>> {
        async { Ok(None) }.boxed()
    }
}

/// Mouth-opening over mouth-width for one frame. Zero-width mouths are
/// geometry noise and yield no score.
pub fn expressiveness_ratio(landmarks: &MouthLandmarks) -> Option<f64> {
    let width = landmarks.left_corner.distance(&landmarks.right_corner);
    if width <= 0.0 {
        return None;
    }
    let opening = landmarks.upper_lip.distance(&landmarks.lower_lip);
    Some(opening / width)
}

/// Arithmetic mean over the frames that produced a valid ratio; `None` when
/// none did.
pub fn mean_expressiveness(scores: &[f64]) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    Some(scores.iter().sum::<f64>() / scores.len() as f64)
}
