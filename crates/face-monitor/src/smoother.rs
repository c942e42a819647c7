//! Temporal smoothing
//!
//! A blink or a momentary head turn must not fire a violation. A condition is
//! promoted to confirmed only when the whole smoothing window agrees on it;
//! when the window stops agreeing, a synthetic clear is emitted so downstream
//! consumers can reset UI state.

use std::collections::VecDeque;

use tracing::debug;
use violations::ViolationType;

use crate::classifier::Candidate;

/// Transition emitted when the smoothed state changes
#[derive(Debug, Clone, PartialEq)]
pub enum SmoothedTransition {
    /// A condition persisted across the full window and is now trusted
    Confirmed(Candidate),

    /// The previously confirmed condition stopped persisting
    Cleared,
}

/// Ring of the last `window` classifier outputs
pub struct TemporalSmoother {
    window: VecDeque<Option<ViolationType>>,
    capacity: usize,
    active: Option<ViolationType>,
}

impl TemporalSmoother {
    pub fn new(window: usize) -> Self {
        Self {
            window: VecDeque::with_capacity(window.max(1)),
            capacity: window.max(1),
            active: None,
        }
    }

    /// The currently confirmed condition, if any
    pub fn active(&self) -> Option<ViolationType> {
        self.active
    }

    /// Feed one tick's candidate; returns a transition when the smoothed
    /// state changes
    pub fn observe(&mut self, candidate: Option<Candidate>) -> Option<SmoothedTransition> {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window
            .push_back(candidate.as_ref().map(|c| c.violation_type));

        let unanimous = self.unanimous_type();

        match (self.active, unanimous) {
            // Window agrees on a condition that is not the active one
            (active, Some(confirmed)) if active != Some(confirmed) => {
                self.active = Some(confirmed);
                debug!(?confirmed, "condition confirmed across smoothing window");
                // The candidate that completed the window carries the details
                candidate.map(SmoothedTransition::Confirmed)
            }
            // Active condition no longer unanimous
            (Some(previous), None) => {
                self.active = None;
                debug!(?previous, "condition cleared");
                Some(SmoothedTransition::Cleared)
            }
            _ => None,
        }
    }

    /// Drop all history, back to the initial Normal state
    pub fn reset(&mut self) {
        self.window.clear();
        self.active = None;
    }

    // Some(t) when the window is full and every entry flags t
    fn unanimous_type(&self) -> Option<ViolationType> {
        if self.window.len() < self.capacity {
            return None;
        }
        let first = (*self.window.front()?)?;
        self.window
            .iter()
            .all(|entry| *entry == Some(first))
            .then_some(first)
    }
}
