//! Proctoring Session Orchestration
//!
//! Wires the monitoring pipeline together for one session:
//! - Immutable per-session configuration (file/env layered)
//! - Single cooperative detection loop: detector, classifier, smoother,
//!   cooldown gate, all synchronous per tick
//! - Event-driven environmental monitors feeding the same aggregator
//! - Camera lifecycle with cross-navigation handoff
//! - Read model for UI binding and the finalized submission metadata

pub mod config;
pub mod session;

pub use config::SessionConfig;
pub use session::{ProctorSession, ReadModel};

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Session-level error types
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error(transparent)]
    Capture(#[from] capture::CaptureError),

    #[error(transparent)]
    Metadata(#[from] violations::MetadataError),
}

/// Initialize logging (binary entry points only)
pub fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}
