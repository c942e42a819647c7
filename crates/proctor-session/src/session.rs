//! Proctoring session lifecycle and detection loop
//!
//! One `ProctorSession` per exam/interview attempt, explicitly constructed
//! and explicitly owned; nothing here outlives the session. Detection runs on
//! a single cooperative polling loop, so classifier, smoother, and cooldown
//! gate execute synchronously per tick and never race on the same frame.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use capture::{
    CameraSource, CaptureError, CaptureManager, FrameSource, HandoffRegistry, StreamConstraints,
    VideoFrame, VideoSink,
};
use env_monitor::{
    FullscreenDriver, FullscreenMonitor, FullscreenSignal, TabVisibilityMonitor, VisibilitySignal,
};
use face_monitor::{
    classify, CooldownGate, EyeMovementTracker, FaceDetector, MonitorConfig, SmoothedTransition,
    TemporalSmoother,
};
use violations::{
    Aggregator, DetectionStatus, MetadataError, ProctorEvent, SessionMetadata, Violation,
    ViolationType,
};

use crate::config::SessionConfig;

/// Live values the UI binds to; latest state only, never a queue
#[derive(Debug, Clone, Default)]
pub struct ReadModel {
    pub status: DetectionStatus,
    pub face_count: usize,
    pub latest_violation: Option<Violation>,
}

/// Per-tick pipeline state. Moves into the loop task on start and moves back
/// on stop, so a session can be restarted.
struct Pipeline {
    frames: Box<dyn FrameSource + Send>,
    detector: Box<dyn FaceDetector + Send>,
    smoother: TemporalSmoother,
    eye_tracker: EyeMovementTracker,
    gate: CooldownGate,
}

pub struct ProctorSession {
    config: SessionConfig,
    aggregator: Arc<Aggregator>,
    read_model: Arc<RwLock<ReadModel>>,
    capture: CaptureManager,
    fullscreen: FullscreenMonitor,
    visibility: TabVisibilityMonitor,
    pipeline: Option<Pipeline>,
    loop_task: Option<JoinHandle<Pipeline>>,
    shutdown: Option<watch::Sender<bool>>,
    started_at: DateTime<Utc>,
}

impl ProctorSession {
    pub fn new(
        config: SessionConfig,
        frames: Box<dyn FrameSource + Send>,
        detector: Box<dyn FaceDetector + Send>,
    ) -> Self {
        let aggregator = Arc::new(Aggregator::new(config.max_violations));
        let monitor_config = config.monitor_config();

        Self {
            capture: CaptureManager::new(config.session_id.clone()),
            fullscreen: FullscreenMonitor::new(aggregator.clone()),
            visibility: TabVisibilityMonitor::new(aggregator.clone()),
            pipeline: Some(Pipeline {
                frames,
                detector,
                smoother: TemporalSmoother::new(config.smooth_frame_count),
                eye_tracker: EyeMovementTracker::new(&monitor_config),
                gate: CooldownGate::new(config.violation_cooldown()),
            }),
            read_model: Arc::new(RwLock::new(ReadModel::default())),
            aggregator,
            started_at: Utc::now(),
            loop_task: None,
            shutdown: None,
            config,
        }
    }

    /// Spawn the detection loop. A no-op if the loop is already running.
    pub fn start_proctoring(&mut self) {
        if self.loop_task.is_some() {
            debug!("proctoring already running");
            return;
        }
        let Some(mut pipeline) = self.pipeline.take() else {
            debug!("pipeline unavailable; proctoring already running");
            return;
        };

        let (tx, mut rx) = watch::channel(false);
        let interval = self.config.detection_interval();
        let monitor_config = self.config.monitor_config();
        let aggregator = self.aggregator.clone();
        let read_model = self.read_model.clone();

        info!(
            session = %self.config.session_id,
            interval_ms = self.config.detection_interval_ms,
            "starting proctoring"
        );

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    changed = rx.changed() => {
                        if changed.is_err() || *rx.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        run_tick(&mut pipeline, &monitor_config, &aggregator, &read_model);
                    }
                }
            }
            info!("detection loop stopped");
            pipeline
        });

        self.shutdown = Some(tx);
        self.loop_task = Some(handle);
    }

    /// Stop the detection loop and conditionally release the camera.
    /// Idempotent; always releases the timer task. The camera release is a
    /// no-op while a handoff is in transit.
    pub async fn stop_proctoring(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(true);
        }
        if let Some(handle) = self.loop_task.take() {
            match handle.await {
                Ok(pipeline) => self.pipeline = Some(pipeline),
                Err(e) => warn!("detection loop did not shut down cleanly: {e}"),
            }
        }
        self.capture.release();
    }

    pub fn is_running(&self) -> bool {
        self.loop_task.is_some()
    }

    // --- environmental signals (event-driven, may land between ticks) ---

    pub fn fullscreen_signal(&mut self, signal: FullscreenSignal, at: DateTime<Utc>) {
        self.fullscreen.handle_signal(signal, at);
    }

    pub fn visibility_signal(&mut self, signal: VisibilitySignal, at: DateTime<Utc>) {
        self.visibility.handle_signal(signal, at);
    }

    /// Best-effort fullscreen entry; never blocks session progress
    pub fn enter_fullscreen(&self, driver: &dyn FullscreenDriver) {
        self.fullscreen.enter_fullscreen(driver);
    }

    // --- camera lifecycle ---

    pub fn acquire_camera(
        &mut self,
        source: &dyn CameraSource,
        constraints: &StreamConstraints,
    ) -> Result<(), CaptureError> {
        self.capture.acquire(source, constraints).map(|_| ())
    }

    pub fn attach_camera(&self, sink: &mut dyn VideoSink) -> Result<(), CaptureError> {
        self.capture.attach(sink)
    }

    /// Unbind the render sink and park the stream for the next page before
    /// navigating
    pub fn begin_camera_handoff(
        &mut self,
        registry: &HandoffRegistry,
        sink: &mut dyn VideoSink,
    ) -> Result<(), CaptureError> {
        self.capture.begin_handoff(registry, sink, Instant::now())
    }

    /// Claim a stream the previous page parked
    pub fn adopt_camera(&mut self, registry: &HandoffRegistry) -> Result<(), CaptureError> {
        self.capture.adopt(registry, Instant::now())
    }

    // --- read model & outputs ---

    pub fn status(&self) -> DetectionStatus {
        self.read().status
    }

    pub fn face_count(&self) -> usize {
        self.read().face_count
    }

    pub fn latest_violation(&self) -> Option<Violation> {
        self.read().latest_violation.clone()
    }

    /// Subscribe to the typed violation event stream
    pub fn subscribe(&self) -> broadcast::Receiver<ProctorEvent> {
        self.aggregator.subscribe()
    }

    pub fn get_statistics(&self) -> HashMap<ViolationType, usize> {
        self.aggregator.statistics()
    }

    pub fn total_violations(&self) -> usize {
        self.aggregator.total()
    }

    pub fn threshold_reached(&self) -> bool {
        self.aggregator.threshold_reached()
    }

    /// Explicit operator reset of the ledger, latch, and pipeline state
    pub fn clear_violations(&mut self) {
        self.aggregator.clear();
        if let Some(pipeline) = self.pipeline.as_mut() {
            pipeline.smoother.reset();
            pipeline.eye_tracker.reset();
            pipeline.gate.reset();
        }
        let mut model = self
            .read_model
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *model = ReadModel::default();
    }

    /// Encode a still frame as JPEG evidence. Best-effort: a failure is
    /// logged and the violation record stands without it.
    pub fn capture_snapshot(&self, frame: &VideoFrame) -> Option<Vec<u8>> {
        match frame.to_jpeg(self.config.snapshot_jpeg_quality) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("snapshot capture failed, evidence skipped: {e}");
                None
            }
        }
    }

    /// Project the ledger into the submission shape. Pass `submitted_at` at
    /// submission time to stamp the timing tail.
    pub fn finalize(
        &self,
        submitted_at: Option<DateTime<Utc>>,
    ) -> Result<SessionMetadata, MetadataError> {
        let (snapshot, threshold_reached) = self.aggregator.snapshot();
        SessionMetadata::build(snapshot, threshold_reached, self.started_at, submitted_at)
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn read(&self) -> ReadModel {
        self.read_model
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// One synchronous pass: frame -> detector -> classifier -> smoother ->
/// cooldown gate -> aggregator.
fn run_tick(
    pipeline: &mut Pipeline,
    config: &MonitorConfig,
    aggregator: &Aggregator,
    read_model: &RwLock<ReadModel>,
) {
    let Some(frame) = pipeline.frames.next_frame() else {
        debug!("no frame available, skipping tick");
        return;
    };

    let observation = match pipeline.detector.detect(&frame) {
        Ok(observation) => observation.accept(config.min_confidence),
        Err(e) => {
            // A transient inference failure is a missed sample; only the
            // smoothing window may conclude the face is actually absent.
            debug!("detector failed, skipping tick: {e}");
            return;
        }
    };

    {
        let mut model = read_model.write().unwrap_or_else(PoisonError::into_inner);
        if model.face_count != observation.face_count {
            model.face_count = observation.face_count;
            aggregator.publish_face_count(observation.face_count);
        }
    }

    let now = Instant::now();
    let classification = classify(&observation, config);

    if let Some(transition) = pipeline.smoother.observe(classification.candidate) {
        match transition {
            SmoothedTransition::Confirmed(candidate) => {
                let status = candidate.status();
                set_status(read_model, aggregator, status);

                if pipeline.gate.admit(candidate.violation_type, now) {
                    let violation = Violation::new(
                        candidate.violation_type,
                        candidate.severity,
                        candidate.message,
                        Utc::now(),
                    );
                    record_face_violation(read_model, aggregator, violation);
                }
            }
            SmoothedTransition::Cleared => {
                set_status(read_model, aggregator, DetectionStatus::Normal);
            }
        }
    }

    // Eye movement is an independent track; it may co-fire with a geometry
    // violation in the same tick and dedups under its own cooldown key.
    if let Some(candidate) = pipeline.eye_tracker.observe(observation.gaze_offset) {
        if pipeline.gate.admit(ViolationType::EyeMovement, now) {
            let violation = Violation::new(
                candidate.violation_type,
                candidate.severity,
                candidate.message,
                Utc::now(),
            );
            record_face_violation(read_model, aggregator, violation);
        }
    }
}

fn set_status(read_model: &RwLock<ReadModel>, aggregator: &Aggregator, status: DetectionStatus) {
    let mut model = read_model.write().unwrap_or_else(PoisonError::into_inner);
    if model.status != status {
        model.status = status;
        aggregator.publish_status(status);
    }
}

fn record_face_violation(
    read_model: &RwLock<ReadModel>,
    aggregator: &Aggregator,
    violation: Violation,
) {
    {
        let mut model = read_model.write().unwrap_or_else(PoisonError::into_inner);
        model.latest_violation = Some(violation.clone());
    }
    aggregator.record_face_violation(violation);
}

#[cfg(test)]
mod tests {
    use super::*;
    use capture::StubFrameSource;
    use face_monitor::{DetectError, FaceObservation};

    /// Detector that replays a script; `None` entries fail the tick
    struct ScriptedDetector {
        script: Vec<Option<FaceObservation>>,
        position: usize,
    }

    impl ScriptedDetector {
        fn new(script: Vec<Option<FaceObservation>>) -> Self {
            Self {
                script,
                position: 0,
            }
        }

        fn repeating(observation: FaceObservation) -> Self {
            Self::new(vec![Some(observation)])
        }
    }

    impl FaceDetector for ScriptedDetector {
        fn detect(&mut self, _frame: &VideoFrame) -> Result<FaceObservation, DetectError> {
            let entry = self
                .script
                .get(self.position)
                .or_else(|| self.script.last())
                .cloned()
                .flatten();
            self.position += 1;
            entry.ok_or_else(|| DetectError::Inference("scripted failure".into()))
        }
    }

    fn test_config() -> SessionConfig {
        SessionConfig {
            smooth_frame_count: 3,
            detection_interval_ms: 10,
            violation_cooldown_ms: 60_000,
            max_violations: 10,
            eye_movement_window: 2,
            ..Default::default()
        }
    }

    fn session_with(config: SessionConfig, detector: ScriptedDetector) -> ProctorSession {
        ProctorSession::new(
            config,
            Box::new(StubFrameSource::new(120, 32, 32)),
            Box::new(detector),
        )
    }

    fn tick(session: &mut ProctorSession) {
        let pipeline = session.pipeline.as_mut().expect("pipeline parked");
        run_tick(
            pipeline,
            &session.config.monitor_config(),
            &session.aggregator,
            &session.read_model,
        );
    }

    #[test]
    fn test_sustained_absence_yields_one_violation() {
        let mut session = session_with(
            test_config(),
            ScriptedDetector::repeating(FaceObservation::absent(120.0)),
        );

        for _ in 0..10 {
            tick(&mut session);
        }

        assert_eq!(session.total_violations(), 1);
        assert_eq!(
            session.get_statistics()[&ViolationType::NoFace],
            1
        );
        assert_eq!(session.status(), DetectionStatus::Violation);
        assert_eq!(session.face_count(), 0);
    }

    #[test]
    fn test_low_confidence_confirms_on_third_tick() {
        let low_confidence = FaceObservation {
            confidence: 0.5,
            ..FaceObservation::nominal()
        };
        let config = SessionConfig {
            min_face_size: 20.0,
            max_face_size: 75.0,
            min_confidence_for_valid_face: 0.82,
            smooth_frame_count: 3,
            ..test_config()
        };
        let mut session = session_with(config, ScriptedDetector::repeating(low_confidence));

        tick(&mut session);
        tick(&mut session);
        assert_eq!(session.total_violations(), 0);

        tick(&mut session);
        assert_eq!(session.total_violations(), 1);
        assert_eq!(
            session.latest_violation().unwrap().violation_type,
            ViolationType::NoFace
        );
    }

    #[test]
    fn test_sub_floor_detection_reports_empty_frame() {
        // Below the reporting floor the detection is discarded outright: the
        // read model shows an empty frame, not a face of one
        let ghost = FaceObservation {
            confidence: 0.3,
            ..FaceObservation::nominal()
        };
        let mut session = session_with(test_config(), ScriptedDetector::repeating(ghost));

        tick(&mut session);
        assert_eq!(session.face_count(), 0);

        tick(&mut session);
        tick(&mut session);
        assert_eq!(
            session.latest_violation().unwrap().violation_type,
            ViolationType::NoFace
        );
    }

    #[test]
    fn test_detector_failure_is_a_missed_tick() {
        let absent = FaceObservation::absent(120.0);
        // Failures interleaved; only successful ticks feed the smoother
        let mut session = session_with(
            test_config(),
            ScriptedDetector::new(vec![
                None,
                Some(absent.clone()),
                None,
                Some(absent.clone()),
                Some(absent.clone()),
                Some(absent),
            ]),
        );

        for _ in 0..4 {
            tick(&mut session);
        }
        // Three successes have not yet accumulated
        assert_eq!(session.total_violations(), 0);

        tick(&mut session);
        tick(&mut session);
        assert_eq!(session.total_violations(), 1);
    }

    #[test]
    fn test_all_failures_never_violate() {
        let mut session = session_with(test_config(), ScriptedDetector::new(vec![None]));
        for _ in 0..20 {
            tick(&mut session);
        }
        assert_eq!(session.total_violations(), 0);
        assert_eq!(session.status(), DetectionStatus::Normal);
    }

    #[test]
    fn test_recovery_emits_normal_status() {
        let absent = FaceObservation::absent(120.0);
        let nominal = FaceObservation::nominal();
        let mut session = session_with(
            test_config(),
            ScriptedDetector::new(vec![
                Some(absent.clone()),
                Some(absent.clone()),
                Some(absent),
                Some(nominal),
            ]),
        );
        let mut events = session.subscribe();

        for _ in 0..4 {
            tick(&mut session);
        }

        assert_eq!(session.status(), DetectionStatus::Normal);
        let mut saw_clear = false;
        while let Ok(event) = events.try_recv() {
            if matches!(event, ProctorEvent::StatusChanged(DetectionStatus::Normal)) {
                saw_clear = true;
            }
        }
        assert!(saw_clear);
        assert_eq!(session.total_violations(), 1);
    }

    #[test]
    fn test_eye_movement_cofires_with_normal_geometry() {
        let steady = FaceObservation::nominal();
        let swung = FaceObservation {
            gaze_offset: 0.4,
            ..FaceObservation::nominal()
        };
        let mut session = session_with(
            test_config(),
            ScriptedDetector::new(vec![Some(steady), Some(swung)]),
        );

        tick(&mut session);
        tick(&mut session);

        assert_eq!(session.total_violations(), 1);
        assert_eq!(
            session.get_statistics()[&ViolationType::EyeMovement],
            1
        );
        // Face geometry stayed normal throughout
        assert_eq!(session.status(), DetectionStatus::Normal);
    }

    #[test]
    fn test_clear_violations_resets_everything() {
        let mut session = session_with(
            test_config(),
            ScriptedDetector::repeating(FaceObservation::absent(120.0)),
        );
        for _ in 0..5 {
            tick(&mut session);
        }
        assert_eq!(session.total_violations(), 1);

        session.clear_violations();
        assert_eq!(session.total_violations(), 0);
        assert!(!session.threshold_reached());
        assert_eq!(session.status(), DetectionStatus::Normal);
        assert!(session.latest_violation().is_none());
    }

    #[test]
    fn test_environmental_and_face_violations_share_the_ledger() {
        let mut session = session_with(
            test_config(),
            ScriptedDetector::repeating(FaceObservation::absent(120.0)),
        );
        let t0 = Utc::now();

        for _ in 0..5 {
            tick(&mut session);
        }
        session.visibility_signal(VisibilitySignal::Hidden, t0);
        session.visibility_signal(VisibilitySignal::Visible, t0 + chrono::Duration::seconds(4));
        session.fullscreen_signal(FullscreenSignal::Exited, t0 + chrono::Duration::seconds(10));

        assert_eq!(session.total_violations(), 3);

        let metadata = session.finalize(None).unwrap();
        assert_eq!(metadata.proctoring.face_violations.len(), 1);
        assert_eq!(metadata.proctoring.tab_switches.len(), 1);
        assert_eq!(metadata.proctoring.fullscreen_exits.len(), 1);
        assert_eq!(metadata.proctoring.total_violation_count, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_start_stop_is_idempotent() {
        let mut session = session_with(
            test_config(),
            ScriptedDetector::repeating(FaceObservation::absent(120.0)),
        );

        session.start_proctoring();
        session.start_proctoring(); // no-op
        assert!(session.is_running());

        tokio::time::sleep(std::time::Duration::from_millis(200)).await;

        session.stop_proctoring().await;
        assert!(!session.is_running());
        session.stop_proctoring().await; // idempotent

        // The sustained condition collapsed into a single record
        assert_eq!(session.total_violations(), 1);

        // Pipeline moved back; the session can restart
        session.start_proctoring();
        assert!(session.is_running());
        session.stop_proctoring().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_threshold_event_fires_once_at_crossing() {
        let config = SessionConfig {
            max_violations: 2,
            violation_cooldown_ms: 0,
            smooth_frame_count: 1,
            ..test_config()
        };
        let mut session = session_with(
            config,
            ScriptedDetector::repeating(FaceObservation::absent(120.0)),
        );
        let mut events = session.subscribe();

        // One face violation, then two environmental ones
        tick(&mut session);
        session.fullscreen_signal(FullscreenSignal::Exited, Utc::now());
        session.visibility_signal(VisibilitySignal::Hidden, Utc::now());

        let mut fired = 0;
        while let Ok(event) = events.try_recv() {
            if let ProctorEvent::ThresholdReached { total } = event {
                fired += 1;
                assert_eq!(total, 2);
            }
        }
        assert_eq!(fired, 1);
        assert!(session.threshold_reached());
        assert_eq!(session.total_violations(), 3);
    }
}
