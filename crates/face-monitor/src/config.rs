//! Face-monitor thresholds

use serde::{Deserialize, Serialize};

/// Geometric and confidence thresholds for the face track.
///
/// Created once at session start and read-only thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Minimum face bounding-box height, as % of frame height
    pub min_face_size: f32,

    /// Maximum face bounding-box height, as % of frame height
    pub max_face_size: f32,

    /// Normalized horizontal offset from frame center beyond which the
    /// subject counts as looking away
    pub looking_away_threshold: f32,

    /// Detector confidence floor for reporting a detection at all
    pub min_confidence: f32,

    /// Confidence floor below which a detection is not trusted as a valid
    /// face (guards against a hand over the face scoring as well-positioned)
    pub min_confidence_for_valid_face: f32,

    /// Mean scene luminance (0-255) below which lighting is too poor
    pub poor_lighting_threshold: f32,

    /// Consecutive ticks a condition must persist before it is confirmed
    pub smooth_frame_count: usize,

    /// Gaze-offset delta that counts as unusual eye movement
    pub eye_movement_threshold: f32,

    /// Number of recent gaze samples the eye-movement tracker keeps
    pub eye_movement_window: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            min_face_size: 20.0,
            max_face_size: 75.0,
            looking_away_threshold: 0.3,
            min_confidence: 0.5,
            min_confidence_for_valid_face: 0.8,
            poor_lighting_threshold: 40.0,
            smooth_frame_count: 3,
            eye_movement_threshold: 0.15,
            eye_movement_window: 5,
        }
    }
}

impl MonitorConfig {
    /// Tighter thresholds for high-stakes sessions
    pub fn strict() -> Self {
        Self {
            looking_away_threshold: 0.2,
            min_confidence_for_valid_face: 0.85,
            smooth_frame_count: 2,
            ..Default::default()
        }
    }

    /// Looser thresholds for low-stakes or poor-hardware sessions
    pub fn lenient() -> Self {
        Self {
            looking_away_threshold: 0.4,
            min_confidence_for_valid_face: 0.7,
            smooth_frame_count: 5,
            ..Default::default()
        }
    }
}
