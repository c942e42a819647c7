//! Violation aggregation and event publishing
//!
//! Merges the face-track stream and both environmental monitors into one
//! ledger, and publishes everything downstream consumers need (UI, logger,
//! metadata builder) on a single typed broadcast channel.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::ledger::{LedgerSnapshot, ViolationId, ViolationLedger};
use crate::types::{DetectionStatus, Violation, ViolationType};

/// Events published by the aggregator
#[derive(Debug, Clone)]
pub enum ProctorEvent {
    /// A new violation was appended to the ledger
    Violation(Violation),

    /// A paired violation received its end timestamp
    ViolationCompleted(Violation),

    /// Coarse session health changed
    StatusChanged(DetectionStatus),

    /// Number of faces in frame changed
    FaceCount(usize),

    /// Running total crossed the configured maximum (fires once per arming)
    ThresholdReached { total: usize },
}

struct Inner {
    ledger: ViolationLedger,
    threshold_reached: bool,
}

/// Owns the violation ledger and the threshold latch.
///
/// Appends are serialized behind one lock so a fullscreen-exit event and a
/// face tick that arrive concurrently still produce a consistent total.
pub struct Aggregator {
    inner: Mutex<Inner>,
    events: broadcast::Sender<ProctorEvent>,
    max_violations: usize,
}

impl Aggregator {
    pub fn new(max_violations: usize) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            inner: Mutex::new(Inner {
                ledger: ViolationLedger::new(),
                threshold_reached: false,
            }),
            events,
            max_violations,
        }
    }

    /// Subscribe to the violation event stream
    pub fn subscribe(&self) -> broadcast::Receiver<ProctorEvent> {
        self.events.subscribe()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a confirmed face-track violation
    pub fn record_face_violation(&self, violation: Violation) -> ViolationId {
        let mut inner = self.lock();
        debug!(?violation.violation_type, "recording face violation");
        let id = inner.ledger.push_face(violation.clone());
        self.publish(ProctorEvent::Violation(violation));
        self.check_threshold(&mut inner);
        id
    }

    /// Open a fullscreen-exit record; returns the id to patch on re-entry
    pub fn record_fullscreen_exit(&self, at: DateTime<Utc>) -> ViolationId {
        let violation = Violation::new(
            ViolationType::FullscreenExit,
            ViolationType::FullscreenExit.severity(),
            "Exited fullscreen mode",
            at,
        );
        let mut inner = self.lock();
        let id = inner.ledger.push_fullscreen(violation.clone());
        self.publish(ProctorEvent::Violation(violation));
        self.check_threshold(&mut inner);
        id
    }

    /// Close a fullscreen-exit record with the re-entry time
    pub fn record_fullscreen_return(&self, id: ViolationId, at: DateTime<Utc>) {
        let mut inner = self.lock();
        if let Some(record) = inner.ledger.get_mut(id) {
            record.complete(at);
            let completed = record.clone();
            self.publish(ProctorEvent::ViolationCompleted(completed));
        }
    }

    /// Open a tab-switch record; returns the id to patch when visibility returns
    pub fn record_tab_hidden(&self, at: DateTime<Utc>) -> ViolationId {
        let violation = Violation::new(
            ViolationType::TabSwitch,
            ViolationType::TabSwitch.severity(),
            "Switched away from the session tab",
            at,
        );
        let mut inner = self.lock();
        let id = inner.ledger.push_tab_switch(violation.clone());
        self.publish(ProctorEvent::Violation(violation));
        self.check_threshold(&mut inner);
        id
    }

    /// Close a tab-switch record with the time the tab became visible again
    pub fn record_tab_visible(&self, id: ViolationId, at: DateTime<Utc>) {
        let mut inner = self.lock();
        if let Some(record) = inner.ledger.get_mut(id) {
            record.complete(at);
            let completed = record.clone();
            self.publish(ProctorEvent::ViolationCompleted(completed));
        }
    }

    /// Forward a status change to subscribers
    pub fn publish_status(&self, status: DetectionStatus) {
        self.publish(ProctorEvent::StatusChanged(status));
    }

    /// Forward a face-count change to subscribers
    pub fn publish_face_count(&self, count: usize) {
        self.publish(ProctorEvent::FaceCount(count));
    }

    pub fn total(&self) -> usize {
        self.lock().ledger.total()
    }

    pub fn threshold_reached(&self) -> bool {
        self.lock().threshold_reached
    }

    pub fn statistics(&self) -> HashMap<ViolationType, usize> {
        self.lock().ledger.statistics()
    }

    pub fn snapshot(&self) -> (LedgerSnapshot, bool) {
        let inner = self.lock();
        (inner.ledger.snapshot(), inner.threshold_reached)
    }

    /// Explicit operator reset: empties the ledger and re-arms the latch
    pub fn clear(&self) {
        let mut inner = self.lock();
        info!("clearing violation ledger ({} records)", inner.ledger.total());
        inner.ledger.clear();
        inner.threshold_reached = false;
    }

    // Latch: fires on the false -> true transition only. Re-crossing after a
    // clear re-arms it; nothing else resets it.
    fn check_threshold(&self, inner: &mut Inner) {
        let total = inner.ledger.total();
        if !inner.threshold_reached && total >= self.max_violations {
            inner.threshold_reached = true;
            info!(total, max = self.max_violations, "violation threshold reached");
            self.publish(ProctorEvent::ThresholdReached { total });
        }
    }

    fn publish(&self, event: ProctorEvent) {
        // No receivers is fine; the ledger remains the source of truth.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Severity;
    use chrono::Duration;

    fn face_violation(ty: ViolationType) -> Violation {
        Violation::new(ty, Severity::High, "test", Utc::now())
    }

    fn drain_threshold_events(rx: &mut broadcast::Receiver<ProctorEvent>) -> usize {
        let mut fired = 0;
        while let Ok(event) = rx.try_recv() {
            if matches!(event, ProctorEvent::ThresholdReached { .. }) {
                fired += 1;
            }
        }
        fired
    }

    #[test]
    fn test_threshold_fires_exactly_once() {
        let agg = Aggregator::new(10);
        let mut rx = agg.subscribe();

        for _ in 0..9 {
            agg.record_face_violation(face_violation(ViolationType::NoFace));
        }
        assert!(!agg.threshold_reached());
        assert_eq!(drain_threshold_events(&mut rx), 0);

        // Tenth violation, of a different type, crosses the threshold
        agg.record_tab_hidden(Utc::now());
        assert!(agg.threshold_reached());
        assert_eq!(drain_threshold_events(&mut rx), 1);

        // Eleventh must not re-fire
        agg.record_face_violation(face_violation(ViolationType::MultipleFaces));
        assert_eq!(drain_threshold_events(&mut rx), 0);
        assert_eq!(agg.total(), 11);
    }

    #[test]
    fn test_clear_rearms_latch() {
        let agg = Aggregator::new(2);
        let mut rx = agg.subscribe();

        agg.record_face_violation(face_violation(ViolationType::NoFace));
        agg.record_face_violation(face_violation(ViolationType::NoFace));
        assert_eq!(drain_threshold_events(&mut rx), 1);

        agg.clear();
        assert_eq!(agg.total(), 0);
        assert!(!agg.threshold_reached());

        agg.record_face_violation(face_violation(ViolationType::NoFace));
        agg.record_face_violation(face_violation(ViolationType::NoFace));
        assert_eq!(drain_threshold_events(&mut rx), 1);
    }

    #[test]
    fn test_fullscreen_pair_patches_one_record() {
        let agg = Aggregator::new(100);
        let exit_at = Utc::now();

        let id = agg.record_fullscreen_exit(exit_at);
        agg.record_fullscreen_return(id, exit_at + Duration::milliseconds(2500));

        let (snap, _) = agg.snapshot();
        assert_eq!(snap.fullscreen_exits.len(), 1);
        let record = &snap.fullscreen_exits[0];
        assert!(record.timestamp_returned.is_some());
        assert!((record.duration_seconds.unwrap() - 2.5).abs() < 1e-9);
        assert_eq!(agg.total(), 1);
    }

    #[test]
    fn test_tab_switch_duration() {
        let agg = Aggregator::new(100);
        let hidden_at = Utc::now();

        let id = agg.record_tab_hidden(hidden_at);
        agg.record_tab_visible(id, hidden_at + Duration::milliseconds(4200));

        let (snap, _) = agg.snapshot();
        assert_eq!(snap.tab_switches.len(), 1);
        assert!((snap.tab_switches[0].duration_seconds.unwrap() - 4.2).abs() < 1e-9);
    }

    #[test]
    fn test_events_reach_subscribers() {
        let agg = Aggregator::new(100);
        let mut rx = agg.subscribe();

        agg.record_face_violation(face_violation(ViolationType::LookingAway));
        agg.publish_status(DetectionStatus::Warning);
        agg.publish_face_count(2);

        assert!(matches!(rx.try_recv().unwrap(), ProctorEvent::Violation(_)));
        assert!(matches!(
            rx.try_recv().unwrap(),
            ProctorEvent::StatusChanged(DetectionStatus::Warning)
        ));
        assert!(matches!(rx.try_recv().unwrap(), ProctorEvent::FaceCount(2)));
    }
}
