//! Eye-movement tracking
//!
//! A secondary signal independent of face geometry: rapid gaze-offset swings
//! inside a short window flag unusual eye movement. It can co-fire with a
//! geometry violation in the same tick; the cooldown gate dedups it under its
//! own type key.

use std::collections::VecDeque;

use violations::ViolationType;

use crate::classifier::Candidate;
use crate::config::MonitorConfig;

pub struct EyeMovementTracker {
    samples: VecDeque<f32>,
    capacity: usize,
    threshold: f32,
}

impl EyeMovementTracker {
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            samples: VecDeque::with_capacity(config.eye_movement_window.max(2)),
            capacity: config.eye_movement_window.max(2),
            threshold: config.eye_movement_threshold,
        }
    }

    /// Feed one gaze sample; returns a candidate when the swing across the
    /// full window exceeds the micro-threshold
    pub fn observe(&mut self, gaze_offset: f32) -> Option<Candidate> {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(gaze_offset);

        if self.samples.len() < self.capacity {
            return None;
        }

        let min = self.samples.iter().copied().fold(f32::INFINITY, f32::min);
        let max = self
            .samples
            .iter()
            .copied()
            .fold(f32::NEG_INFINITY, f32::max);

        (max - min > self.threshold).then(|| Candidate {
            violation_type: ViolationType::EyeMovement,
            severity: ViolationType::EyeMovement.severity(),
            message: "Unusual eye movement detected".into(),
        })
    }

    pub fn reset(&mut self) {
        self.samples.clear();
    }
}
