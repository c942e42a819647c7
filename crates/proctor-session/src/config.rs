//! Session configuration
//!
//! One immutable `SessionConfig` per session. Values layer as
//! defaults <- optional TOML file <- `PROCTOR_*` environment variables.

use std::path::Path;
use std::time::Duration;

use face_monitor::MonitorConfig;
use serde::{Deserialize, Serialize};

use crate::SessionError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session identifier, also scopes the camera handoff handle
    pub session_id: String,

    /// Minimum face bounding-box height, as % of frame height
    pub min_face_size: f32,

    /// Maximum face bounding-box height, as % of frame height
    pub max_face_size: f32,

    /// Normalized horizontal offset beyond which the subject is looking away
    pub looking_away_threshold: f32,

    /// Detector confidence floor for reporting a detection
    pub min_confidence: f32,

    /// Confidence floor below which a detection is not a valid face
    pub min_confidence_for_valid_face: f32,

    /// Mean scene luminance (0-255) below which lighting is too poor
    pub poor_lighting_threshold: f32,

    /// Consecutive ticks a condition must persist before confirmation
    pub smooth_frame_count: usize,

    /// Gaze-offset delta that counts as unusual eye movement
    pub eye_movement_threshold: f32,

    /// Gaze samples kept by the eye-movement tracker
    pub eye_movement_window: usize,

    /// Detection polling interval (ms)
    pub detection_interval_ms: u64,

    /// Suppression window for repeated violations of one type (ms)
    pub violation_cooldown_ms: u64,

    /// Violation count at which the threshold latch fires
    pub max_violations: usize,

    /// How long a handed-off stream may wait for adoption (ms)
    pub handoff_grace_ms: u64,

    /// JPEG quality for evidence snapshots
    pub snapshot_jpeg_quality: u8,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: "local".to_string(),
            min_face_size: 20.0,
            max_face_size: 75.0,
            looking_away_threshold: 0.3,
            min_confidence: 0.5,
            min_confidence_for_valid_face: 0.8,
            poor_lighting_threshold: 40.0,
            smooth_frame_count: 3,
            eye_movement_threshold: 0.15,
            eye_movement_window: 5,
            detection_interval_ms: 1000,
            violation_cooldown_ms: 10_000,
            max_violations: 10,
            handoff_grace_ms: 5_000,
            snapshot_jpeg_quality: 80,
        }
    }
}

impl SessionConfig {
    /// Load layered configuration
    pub fn load(path: Option<&Path>) -> Result<Self, SessionError> {
        let mut builder = ::config::Config::builder()
            .add_source(::config::Config::try_from(&SessionConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path));
        }

        let settings = builder
            .add_source(::config::Environment::with_prefix("PROCTOR"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Thresholds consumed by the face-track pipeline
    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            min_face_size: self.min_face_size,
            max_face_size: self.max_face_size,
            looking_away_threshold: self.looking_away_threshold,
            min_confidence: self.min_confidence,
            min_confidence_for_valid_face: self.min_confidence_for_valid_face,
            poor_lighting_threshold: self.poor_lighting_threshold,
            smooth_frame_count: self.smooth_frame_count,
            eye_movement_threshold: self.eye_movement_threshold,
            eye_movement_window: self.eye_movement_window,
        }
    }

    pub fn detection_interval(&self) -> Duration {
        Duration::from_millis(self.detection_interval_ms)
    }

    pub fn violation_cooldown(&self) -> Duration {
        Duration::from_millis(self.violation_cooldown_ms)
    }

    pub fn handoff_grace(&self) -> Duration {
        Duration::from_millis(self.handoff_grace_ms)
    }
}
