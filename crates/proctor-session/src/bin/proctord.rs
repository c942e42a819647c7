//! Proctoring core demo entry point
//!
//! Runs a short stub-detector session and prints the finalized submission
//! metadata, exercising the full pipeline end to end.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tracing::info;

use capture::{StreamConstraints, StubCameraSource, StubFrameSource};
use env_monitor::VisibilitySignal;
use face_monitor::StubDetector;
use proctor_session::{init_logging, ProctorSession, SessionConfig};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    info!("=== Proctor Core v{} ===", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::args().nth(1);
    let config = SessionConfig::load(config_path.as_deref().map(Path::new))?;
    info!(session = %config.session_id, "configuration loaded");

    let mut session = ProctorSession::new(
        config,
        Box::new(StubFrameSource::new(120, 640, 480)),
        Box::new(StubDetector::nominal()),
    );

    session.acquire_camera(&StubCameraSource::working(), &StreamConstraints::default())?;
    session.start_proctoring();

    // Simulate a short attempt with one tab switch
    tokio::time::sleep(Duration::from_secs(2)).await;
    session.visibility_signal(VisibilitySignal::Hidden, Utc::now());
    tokio::time::sleep(Duration::from_secs(1)).await;
    session.visibility_signal(VisibilitySignal::Visible, Utc::now());
    tokio::time::sleep(Duration::from_secs(1)).await;

    session.stop_proctoring().await;

    let metadata = session.finalize(Some(Utc::now()))?;
    println!("{}", serde_json::to_string_pretty(&metadata)?);

    Ok(())
}
