//! Face-Track Monitoring
//!
//! Per-tick pipeline for the camera track:
//! - Opaque detector boundary producing one `FaceObservation` per tick
//! - Pure frame classifier mapping an observation to a violation candidate
//! - Temporal smoother absorbing single-frame detector noise
//! - Independent eye-movement tracker
//! - Cooldown gate collapsing a continuous condition into one violation

pub mod classifier;
pub mod config;
pub mod cooldown;
pub mod detector;
pub mod eye;
pub mod smoother;

pub use classifier::{classify, Candidate, Classification};
pub use config::MonitorConfig;
pub use cooldown::CooldownGate;
pub use detector::{DetectError, FaceDetector, FaceObservation, StubDetector};
pub use eye::EyeMovementTracker;
pub use smoother::{SmoothedTransition, TemporalSmoother};
