//! Detector boundary
//!
//! The inference algorithm itself is opaque: given a frame, return what was
//! seen. A failed tick is reported as an error and treated upstream as a
//! missed sample, never as a confirmed absence.

use capture::VideoFrame;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectError {
    #[error("inference failed: {0}")]
    Inference(String),

    #[error("detector not ready")]
    NotReady,
}

/// One detection result per polling tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceObservation {
    /// Number of faces detected in the frame
    pub face_count: usize,

    /// Primary face bounding-box height, as % of frame height
    pub height_ratio: f32,

    /// Primary face horizontal offset from frame center, normalized 0..1
    pub horizontal_offset: f32,

    /// Mean scene luminance (0-255)
    pub lighting: f32,

    /// Detector confidence for the primary face
    pub confidence: f32,

    /// Landmark-derived gaze offset, normalized
    pub gaze_offset: f32,
}

impl FaceObservation {
    /// A well-positioned, well-lit single face
    pub fn nominal() -> Self {
        Self {
            face_count: 1,
            height_ratio: 45.0,
            horizontal_offset: 0.05,
            lighting: 120.0,
            confidence: 0.95,
            gaze_offset: 0.0,
        }
    }

    /// An empty frame
    pub fn absent(lighting: f32) -> Self {
        Self {
            face_count: 0,
            height_ratio: 0.0,
            horizontal_offset: 0.0,
            lighting,
            confidence: 0.0,
            gaze_offset: 0.0,
        }
    }

    /// Apply the reporting floor. Detections the model scores below
    /// `min_confidence` never leave the boundary, so a frame whose primary
    /// detection falls under the floor is an empty frame (lighting kept).
    pub fn accept(self, min_confidence: f32) -> Self {
        if self.face_count > 0 && self.confidence < min_confidence {
            Self::absent(self.lighting)
        } else {
            self
        }
    }
}

/// Opaque face/landmark inference capability
pub trait FaceDetector {
    fn detect(&mut self, frame: &VideoFrame) -> Result<FaceObservation, DetectError>;
}

/// Detector stub deriving lighting from the frame and everything else from a
/// fixed observation. Used by tests and the demo binary.
pub struct StubDetector {
    observation: FaceObservation,
}

impl StubDetector {
    pub fn new(observation: FaceObservation) -> Self {
        Self { observation }
    }

    pub fn nominal() -> Self {
        Self::new(FaceObservation::nominal())
    }
}

impl FaceDetector for StubDetector {
    fn detect(&mut self, frame: &VideoFrame) -> Result<FaceObservation, DetectError> {
        let mut obs = self.observation.clone();
        obs.lighting = frame.mean_luma();
        Ok(obs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_discards_sub_floor_detections() {
        let obs = FaceObservation {
            confidence: 0.3,
            ..FaceObservation::nominal()
        };
        let accepted = obs.accept(0.5);
        assert_eq!(accepted.face_count, 0);
        assert_eq!(accepted.lighting, 120.0);
    }

    #[test]
    fn test_accept_passes_confident_detections_through() {
        let obs = FaceObservation::nominal();
        assert_eq!(obs.clone().accept(0.5), obs);
    }

    #[test]
    fn test_stub_detector_takes_lighting_from_frame() {
        let mut detector = StubDetector::nominal();
        let frame = VideoFrame::solid(30, 8, 8);
        let obs = detector.detect(&frame).unwrap();
        assert!(obs.lighting < 31.0);
        assert_eq!(obs.face_count, 1);
    }
}
