//! Violation cooldown gate
//!
//! One continuous condition should produce one violation record, not one per
//! poll tick. The gate keeps a per-type last-emission clock and suppresses a
//! repeat of the same type inside the cooldown window. Different types never
//! suppress each other, and Normal transitions always pass.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::debug;
use violations::ViolationType;

pub struct CooldownGate {
    cooldown: Duration,
    last_emitted: HashMap<ViolationType, Instant>,
}

impl CooldownGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_emitted: HashMap::new(),
        }
    }

    /// Whether a violation of this type may be emitted now. Admission
    /// consumes the window for that type; Normal neither checks nor consumes.
    pub fn admit(&mut self, violation_type: ViolationType, now: Instant) -> bool {
        if violation_type == ViolationType::Normal {
            return true;
        }

        if let Some(last) = self.last_emitted.get(&violation_type) {
            if now.duration_since(*last) < self.cooldown {
                debug!(?violation_type, "violation suppressed by cooldown");
                return false;
            }
        }

        self.last_emitted.insert(violation_type, now);
        true
    }

    /// Forget all emission times (operator reset)
    pub fn reset(&mut self) {
        self.last_emitted.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COOLDOWN: Duration = Duration::from_millis(5000);

    #[test]
    fn test_same_type_suppressed_within_window() {
        let mut gate = CooldownGate::new(COOLDOWN);
        let t0 = Instant::now();

        assert!(gate.admit(ViolationType::NoFace, t0));
        assert!(!gate.admit(ViolationType::NoFace, t0 + Duration::from_millis(1000)));
        assert!(gate.admit(ViolationType::NoFace, t0 + Duration::from_millis(5000)));
    }

    #[test]
    fn test_different_types_do_not_suppress_each_other() {
        let mut gate = CooldownGate::new(COOLDOWN);
        let t0 = Instant::now();

        assert!(gate.admit(ViolationType::NoFace, t0));
        assert!(gate.admit(ViolationType::LookingAway, t0 + Duration::from_millis(100)));
        assert!(gate.admit(ViolationType::PoorLighting, t0 + Duration::from_millis(200)));
    }

    #[test]
    fn test_normal_always_passes_and_keeps_window_intact() {
        let mut gate = CooldownGate::new(COOLDOWN);
        let t0 = Instant::now();

        assert!(gate.admit(ViolationType::NoFace, t0));
        assert!(gate.admit(ViolationType::Normal, t0 + Duration::from_millis(10)));
        assert!(gate.admit(ViolationType::Normal, t0 + Duration::from_millis(20)));
        // NoFace window still consumed
        assert!(!gate.admit(ViolationType::NoFace, t0 + Duration::from_millis(30)));
    }

    #[test]
    fn test_reset_reopens_all_windows() {
        let mut gate = CooldownGate::new(COOLDOWN);
        let t0 = Instant::now();

        assert!(gate.admit(ViolationType::NoFace, t0));
        gate.reset();
        assert!(gate.admit(ViolationType::NoFace, t0 + Duration::from_millis(1)));
    }
}
