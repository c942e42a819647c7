//! Frame classifier
//!
//! Pure function of one observation and the configured thresholds. No timers,
//! no memory; smoothing and deduplication happen downstream.

use violations::{DetectionStatus, Severity, ViolationType};

use crate::config::MonitorConfig;
use crate::detector::FaceObservation;

/// A violation candidate awaiting temporal confirmation
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub violation_type: ViolationType,
    pub severity: Severity,
    pub message: String,
}

impl Candidate {
    fn new(violation_type: ViolationType, message: impl Into<String>) -> Self {
        Self {
            violation_type,
            severity: violation_type.severity(),
            message: message.into(),
        }
    }

    /// Coarse status implied by this candidate's severity
    pub fn status(&self) -> DetectionStatus {
        match self.severity {
            Severity::High => DetectionStatus::Violation,
            Severity::Medium | Severity::Low => DetectionStatus::Warning,
        }
    }
}

/// Classifier output for one tick
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub status: DetectionStatus,
    pub candidate: Option<Candidate>,
}

impl Classification {
    fn normal() -> Self {
        Self {
            status: DetectionStatus::Normal,
            candidate: None,
        }
    }

    fn flagged(candidate: Candidate) -> Self {
        Self {
            status: candidate.status(),
            candidate: Some(candidate),
        }
    }
}

/// Classify one observation. First matching rule wins.
pub fn classify(obs: &FaceObservation, config: &MonitorConfig) -> Classification {
    if obs.face_count == 0 {
        return Classification::flagged(Candidate::new(
            ViolationType::NoFace,
            "No face detected in camera view",
        ));
    }

    if obs.face_count > 1 {
        return Classification::flagged(Candidate::new(
            ViolationType::MultipleFaces,
            format!("{} people detected in frame", obs.face_count),
        ));
    }

    // A low-confidence detection is not a valid face. Without this floor a
    // hand covering the face can score as a well-positioned face.
    if obs.confidence < config.min_confidence_for_valid_face {
        return Classification::flagged(Candidate::new(
            ViolationType::NoFace,
            "No face detected in camera view",
        ));
    }

    if obs.height_ratio < config.min_face_size {
        return Classification::flagged(Candidate::new(
            ViolationType::FaceTooFar,
            "Face too far from camera, please move closer",
        ));
    }

    if obs.height_ratio > config.max_face_size {
        return Classification::flagged(Candidate::new(
            ViolationType::FaceTooClose,
            "Face too close to camera, please move back",
        ));
    }

    if obs.horizontal_offset > config.looking_away_threshold {
        return Classification::flagged(Candidate::new(
            ViolationType::LookingAway,
            "Looking away from the screen",
        ));
    }

    if obs.lighting < config.poor_lighting_threshold {
        return Classification::flagged(Candidate::new(
            ViolationType::PoorLighting,
            "Lighting too poor for reliable monitoring",
        ));
    }

    Classification::normal()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::FaceObservation;

    fn config() -> MonitorConfig {
        MonitorConfig::default()
    }

    #[test]
    fn test_no_face_wins_over_everything() {
        let obs = FaceObservation::absent(10.0); // dark AND empty
        let c = classify(&obs, &config());
        assert_eq!(
            c.candidate.unwrap().violation_type,
            ViolationType::NoFace
        );
        assert_eq!(c.status, DetectionStatus::Violation);
    }

    #[test]
    fn test_multiple_faces() {
        let obs = FaceObservation {
            face_count: 3,
            ..FaceObservation::nominal()
        };
        let c = classify(&obs, &config());
        let candidate = c.candidate.unwrap();
        assert_eq!(candidate.violation_type, ViolationType::MultipleFaces);
        assert!(candidate.message.contains('3'));
    }

    #[test]
    fn test_low_confidence_counts_as_no_face() {
        let obs = FaceObservation {
            confidence: 0.5,
            ..FaceObservation::nominal()
        };
        let c = classify(&obs, &config());
        assert_eq!(c.candidate.unwrap().violation_type, ViolationType::NoFace);
    }

    #[test]
    fn test_size_bounds() {
        let far = FaceObservation {
            height_ratio: 12.0,
            ..FaceObservation::nominal()
        };
        assert_eq!(
            classify(&far, &config()).candidate.unwrap().violation_type,
            ViolationType::FaceTooFar
        );

        let close = FaceObservation {
            height_ratio: 88.0,
            ..FaceObservation::nominal()
        };
        let c = classify(&close, &config());
        assert_eq!(
            c.candidate.unwrap().violation_type,
            ViolationType::FaceTooClose
        );
        assert_eq!(c.status, DetectionStatus::Warning);
    }

    #[test]
    fn test_looking_away() {
        let obs = FaceObservation {
            horizontal_offset: 0.45,
            ..FaceObservation::nominal()
        };
        assert_eq!(
            classify(&obs, &config()).candidate.unwrap().violation_type,
            ViolationType::LookingAway
        );
    }

    #[test]
    fn test_poor_lighting() {
        let obs = FaceObservation {
            lighting: 25.0,
            ..FaceObservation::nominal()
        };
        assert_eq!(
            classify(&obs, &config()).candidate.unwrap().violation_type,
            ViolationType::PoorLighting
        );
    }

    #[test]
    fn test_size_checked_before_gaze_and_lighting() {
        // Too far AND looking away AND dark: decision order picks size first
        let obs = FaceObservation {
            height_ratio: 10.0,
            horizontal_offset: 0.5,
            lighting: 20.0,
            ..FaceObservation::nominal()
        };
        assert_eq!(
            classify(&obs, &config()).candidate.unwrap().violation_type,
            ViolationType::FaceTooFar
        );
    }

    #[test]
    fn test_nominal_is_normal() {
        let c = classify(&FaceObservation::nominal(), &config());
        assert_eq!(c.status, DetectionStatus::Normal);
        assert!(c.candidate.is_none());
    }
}
