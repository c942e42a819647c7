//! Per-session capture manager

use std::time::Instant;

use tracing::{debug, info};

use crate::handoff::HandoffRegistry;
use crate::stream::{CameraSource, CameraStream, VideoSink};
use crate::{CaptureError, StreamConstraints};

/// Owns at most one camera stream for one session.
///
/// Only this type starts or stops tracks. The handoff registry is the single
/// legal way ownership crosses a page navigation: after `begin_handoff` the
/// stream lives in the registry and `release` on unmount becomes a no-op.
pub struct CaptureManager {
    session_id: String,
    stream: Option<CameraStream>,
    in_transit: bool,
}

impl CaptureManager {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            stream: None,
            in_transit: false,
        }
    }

    /// Open the camera through the device layer
    pub fn acquire(
        &mut self,
        source: &dyn CameraSource,
        constraints: &StreamConstraints,
    ) -> Result<&CameraStream, CaptureError> {
        if self.stream.is_some() {
            return Err(CaptureError::DeviceBusy);
        }
        let stream = source.acquire(constraints)?;
        info!(session = %self.session_id, stream = %stream.id(), "camera acquired");
        self.stream = Some(stream);
        self.in_transit = false;
        self.stream.as_ref().ok_or(CaptureError::NoStream)
    }

    /// Attach the active stream to a render sink
    pub fn attach(&self, sink: &mut dyn VideoSink) -> Result<(), CaptureError> {
        let stream = self.stream.as_ref().ok_or(CaptureError::NoStream)?;
        sink.attach(stream);
        Ok(())
    }

    /// Park the stream in the registry ahead of a page navigation.
    ///
    /// The page's render sink is unbound first; a sink must never outlive its
    /// stream's residence on this page.
    pub fn begin_handoff(
        &mut self,
        registry: &HandoffRegistry,
        sink: &mut dyn VideoSink,
        now: Instant,
    ) -> Result<(), CaptureError> {
        let stream = self.stream.take().ok_or(CaptureError::NoStream)?;
        sink.detach();
        registry.deposit(&self.session_id, stream, now);
        self.in_transit = true;
        Ok(())
    }

    /// Claim a stream parked by the previous page's manager
    pub fn adopt(&mut self, registry: &HandoffRegistry, now: Instant) -> Result<(), CaptureError> {
        if self.stream.is_some() {
            return Err(CaptureError::DeviceBusy);
        }
        let stream = registry
            .adopt(&self.session_id, now)
            .ok_or(CaptureError::NoStream)?;
        info!(session = %self.session_id, stream = %stream.id(), "adopted handed-off stream");
        self.stream = Some(stream);
        self.in_transit = false;
        Ok(())
    }

    /// Stop tracks and drop the stream. Idempotent; a no-op while the stream
    /// is in transit (the registry owns it until adoption or expiry).
    pub fn release(&mut self) {
        if self.in_transit {
            debug!(session = %self.session_id, "release skipped: stream in transit");
            return;
        }
        if let Some(mut stream) = self.stream.take() {
            info!(session = %self.session_id, stream = %stream.id(), "releasing camera");
            stream.stop_tracks();
        }
    }

    pub fn stream(&self) -> Option<&CameraStream> {
        self.stream.as_ref()
    }

    pub fn is_in_transit(&self) -> bool {
        self.in_transit
    }
}
