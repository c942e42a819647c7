//! Violation taxonomy and record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Classified integrity-rule breach types (closed set, wire-stable names)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationType {
    /// No face visible in the camera view
    NoFace,

    /// More than one person in frame
    MultipleFaces,

    /// Gaze directed away from the screen
    LookingAway,

    /// Face fills too much of the frame
    FaceTooClose,

    /// Face too small in the frame
    FaceTooFar,

    /// Scene too dark for reliable detection
    PoorLighting,

    /// Unusual eye movement pattern
    EyeMovement,

    /// Left fullscreen mode
    FullscreenExit,

    /// Switched away from the session tab
    TabSwitch,

    /// Sentinel: a previously reported condition cleared
    Normal,
}

impl ViolationType {
    /// Default severity assigned when this condition is confirmed
    pub fn severity(&self) -> Severity {
        match self {
            ViolationType::NoFace
            | ViolationType::MultipleFaces
            | ViolationType::FullscreenExit
            | ViolationType::TabSwitch => Severity::High,
            ViolationType::LookingAway
            | ViolationType::FaceTooClose
            | ViolationType::FaceTooFar
            | ViolationType::PoorLighting
            | ViolationType::EyeMovement => Severity::Medium,
            ViolationType::Normal => Severity::Low,
        }
    }
}

/// Violation severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// Coarse session health indicator (latest value, never a queue)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DetectionStatus {
    #[default]
    Normal,
    Warning,
    Violation,
}

/// A discrete, confirmed integrity violation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    #[serde(rename = "type")]
    pub violation_type: ViolationType,

    pub severity: Severity,

    pub message: String,

    /// When the condition was confirmed
    pub timestamp: DateTime<Utc>,

    /// When the condition ended (paired violations only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_returned: Option<DateTime<Utc>>,

    /// Filled in when the matching returned-to-normal event lands
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
}

impl Violation {
    pub fn new(
        violation_type: ViolationType,
        severity: Severity,
        message: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            violation_type,
            severity,
            message: message.into(),
            timestamp,
            timestamp_returned: None,
            duration_seconds: None,
        }
    }

    /// Close a paired violation, stamping the return time and duration
    pub fn complete(&mut self, returned_at: DateTime<Utc>) {
        let elapsed = (returned_at - self.timestamp).num_milliseconds() as f64 / 1000.0;
        self.timestamp_returned = Some(returned_at);
        self.duration_seconds = Some(elapsed);
    }

    /// Whether this is a paired violation still waiting for its end event
    pub fn is_open(&self) -> bool {
        matches!(
            self.violation_type,
            ViolationType::FullscreenExit | ViolationType::TabSwitch
        ) && self.timestamp_returned.is_none()
    }
}
