//! Camera Capture Library
//!
//! Owns the camera stream lifecycle for a proctored session:
//! - Acquisition through an opaque device layer, with classified failures
//! - Attachment to a renderable video sink
//! - Cross-navigation handoff so a live stream survives a page change
//!   without re-prompting for permission

pub mod frame;
pub mod handoff;
pub mod manager;
pub mod stream;

pub use frame::VideoFrame;
pub use handoff::HandoffRegistry;
pub use manager::CaptureManager;
pub use stream::{CameraSource, CameraStream, FrameSource, StubCameraSource, StubFrameSource, VideoSink};

use thiserror::Error;

/// Classified camera failures. None of these are fatal to the application;
/// the caller decides whether to block session progress.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("camera permission denied")]
    PermissionDenied,

    #[error("no camera device found")]
    DeviceNotFound,

    #[error("camera is in use by another application")]
    DeviceBusy,

    #[error("camera capture is not supported in this environment")]
    Unsupported,

    #[error("no active stream")]
    NoStream,

    #[error("snapshot encoding failed: {0}")]
    Encode(String),
}

impl CaptureError {
    /// Distinct user-facing message per failure class
    pub fn user_message(&self) -> &'static str {
        match self {
            CaptureError::PermissionDenied => {
                "Camera access was denied. Please allow camera access and try again."
            }
            CaptureError::DeviceNotFound => {
                "No camera was found. Please connect a camera and try again."
            }
            CaptureError::DeviceBusy => {
                "Your camera is in use by another application. Close it and try again."
            }
            CaptureError::Unsupported => {
                "Your browser does not support camera capture. Please use a supported browser."
            }
            CaptureError::NoStream | CaptureError::Encode(_) => {
                "The camera stream is unavailable. Please restart the device check."
            }
        }
    }
}

/// Requested stream parameters
#[derive(Debug, Clone)]
pub struct StreamConstraints {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for StreamConstraints {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fps: 30,
        }
    }
}
