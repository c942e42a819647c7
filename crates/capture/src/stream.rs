//! Camera stream handle and device-layer traits

use uuid::Uuid;

use crate::frame::VideoFrame;
use crate::{CaptureError, StreamConstraints};

/// Handle to a live camera stream.
///
/// Only the capture layer stops tracks; everything else reads frames.
#[derive(Debug, PartialEq, Eq)]
pub struct CameraStream {
    id: Uuid,
    live: bool,
}

impl CameraStream {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            live: true,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Stop all tracks. Capture-layer internal; consumers never call this.
    pub(crate) fn stop_tracks(&mut self) {
        self.live = false;
    }
}

impl Default for CameraStream {
    fn default() -> Self {
        Self::new()
    }
}

/// Opaque device layer that can open a camera
pub trait CameraSource {
    fn acquire(&self, constraints: &StreamConstraints) -> Result<CameraStream, CaptureError>;
}

/// Renderable surface the stream is attached to (the video element collaborator)
pub trait VideoSink {
    fn attach(&mut self, stream: &CameraStream);
    fn detach(&mut self);
}

/// Produces the current frame for detection ticks
pub trait FrameSource {
    /// The latest decoded frame, or None if no frame is available this tick
    fn next_frame(&mut self) -> Option<VideoFrame>;
}

/// Device layer stub for tests and the demo binary
pub struct StubCameraSource {
    fail_with: Option<CaptureError>,
}

impl StubCameraSource {
    pub fn working() -> Self {
        Self { fail_with: None }
    }

    pub fn failing(error: CaptureError) -> Self {
        Self {
            fail_with: Some(error),
        }
    }
}

impl CameraSource for StubCameraSource {
    fn acquire(&self, _constraints: &StreamConstraints) -> Result<CameraStream, CaptureError> {
        match &self.fail_with {
            Some(e) => Err(e.clone()),
            None => Ok(CameraStream::new()),
        }
    }
}

/// Frame source stub emitting solid-gray frames
pub struct StubFrameSource {
    luma: u8,
    width: u32,
    height: u32,
    sequence: u32,
}

impl StubFrameSource {
    pub fn new(luma: u8, width: u32, height: u32) -> Self {
        Self {
            luma,
            width,
            height,
            sequence: 0,
        }
    }
}

impl FrameSource for StubFrameSource {
    fn next_frame(&mut self) -> Option<VideoFrame> {
        self.sequence += 1;
        let mut frame = VideoFrame::solid(self.luma, self.width, self.height);
        frame.sequence = self.sequence;
        Some(frame)
    }
}
