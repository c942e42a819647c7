//! Environmental Monitors
//!
//! Two independent, purely event-driven sources of integrity violations:
//! - Fullscreen monitor (fullscreen enter/exit)
//! - Tab-visibility monitor (page visibility change)
//!
//! Each is a two-state machine producing start/end-paired violation records
//! with duration, appended directly to the shared aggregator.

pub mod fullscreen;
pub mod visibility;

pub use fullscreen::{FullscreenDriver, FullscreenError, FullscreenMonitor, FullscreenSignal};
pub use visibility::{TabVisibilityMonitor, VisibilitySignal};
