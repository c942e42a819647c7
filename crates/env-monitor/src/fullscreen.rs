//! Fullscreen state monitor

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, warn};
use violations::{Aggregator, ViolationId};

#[derive(Error, Debug)]
pub enum FullscreenError {
    #[error("fullscreen request rejected: {0}")]
    Rejected(String),
}

/// Fullscreen transitions reported by the page collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FullscreenSignal {
    Entered,
    Exited,
}

/// Surface that can be asked to enter fullscreen
pub trait FullscreenDriver {
    fn request_fullscreen(&self) -> Result<(), FullscreenError>;
}

/// States: Normal (in fullscreen or never entered) and Exited (open record).
///
/// Exit opens a `FullscreenExit` violation; re-entry patches the same record
/// with the return timestamp, from which the duration derives.
pub struct FullscreenMonitor {
    aggregator: Arc<Aggregator>,
    open_exit: Option<ViolationId>,
}

impl FullscreenMonitor {
    pub fn new(aggregator: Arc<Aggregator>) -> Self {
        Self {
            aggregator,
            open_exit: None,
        }
    }

    /// Feed one fullscreen transition. Duplicate transitions are ignored.
    pub fn handle_signal(&mut self, signal: FullscreenSignal, at: DateTime<Utc>) {
        match signal {
            FullscreenSignal::Exited => {
                if self.open_exit.is_some() {
                    debug!("duplicate fullscreen-exit signal ignored");
                    return;
                }
                self.open_exit = Some(self.aggregator.record_fullscreen_exit(at));
            }
            FullscreenSignal::Entered => {
                if let Some(id) = self.open_exit.take() {
                    self.aggregator.record_fullscreen_return(id, at);
                }
            }
        }
    }

    /// Ask the surface to enter fullscreen. Best-effort by contract: a
    /// rejection is logged and swallowed, never surfaced, so session progress
    /// is never blocked on it.
    pub fn enter_fullscreen(&self, driver: &dyn FullscreenDriver) {
        if let Err(e) = driver.request_fullscreen() {
            warn!("fullscreen request failed: {e}");
        }
    }

    pub fn is_exited(&self) -> bool {
        self.open_exit.is_some()
    }
}
