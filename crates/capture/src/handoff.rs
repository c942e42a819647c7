//! Cross-navigation stream handoff
//!
//! A device-check page that is about to navigate to the live session deposits
//! its stream here; the next page adopts it instead of re-acquiring the
//! camera, so the user is not prompted a second time. Deposits are one-shot
//! and expire after a grace period, at which point the stream is
//! force-released so the camera indicator cannot leak.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::stream::CameraStream;

struct Deposit {
    stream: CameraStream,
    deadline: Instant,
}

/// Session-scoped handoff handles. Explicitly constructed and passed to the
/// managers that take part in a handoff; there is no ambient global registry.
pub struct HandoffRegistry {
    deposits: Mutex<HashMap<String, Deposit>>,
    grace: Duration,
}

impl HandoffRegistry {
    pub fn new(grace: Duration) -> Self {
        Self {
            deposits: Mutex::new(HashMap::new()),
            grace,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Deposit>> {
        self.deposits.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Park a live stream under the session id, starting the grace clock.
    /// A second deposit for the same session replaces (and releases) the first.
    pub fn deposit(&self, session_id: &str, stream: CameraStream, now: Instant) {
        debug!(session_id, stream = %stream.id(), "depositing stream for handoff");
        let mut deposits = self.lock();
        if let Some(mut previous) = deposits.remove(session_id) {
            warn!(session_id, "replacing unclaimed handoff deposit");
            previous.stream.stop_tracks();
        }
        deposits.insert(
            session_id.to_string(),
            Deposit {
                stream,
                deadline: now + self.grace,
            },
        );
    }

    /// Claim the deposited stream. One-shot: the handle is cleared on the
    /// first adoption. A deposit past its deadline is released, not adopted.
    pub fn adopt(&self, session_id: &str, now: Instant) -> Option<CameraStream> {
        let mut deposits = self.lock();
        let mut deposit = deposits.remove(session_id)?;
        if now > deposit.deadline {
            warn!(session_id, "handoff deposit expired before adoption");
            deposit.stream.stop_tracks();
            return None;
        }
        debug!(session_id, stream = %deposit.stream.id(), "stream adopted");
        Some(deposit.stream)
    }

    /// Force-release every deposit past its deadline. Returns the number of
    /// streams released.
    pub fn expire(&self, now: Instant) -> usize {
        let mut deposits = self.lock();
        let expired: Vec<String> = deposits
            .iter()
            .filter(|(_, d)| now > d.deadline)
            .map(|(k, _)| k.clone())
            .collect();
        for key in &expired {
            if let Some(mut deposit) = deposits.remove(key) {
                warn!(session_id = %key, "force-releasing expired handoff stream");
                deposit.stream.stop_tracks();
            }
        }
        expired.len()
    }

    pub fn pending(&self) -> usize {
        self.lock().len()
    }
}
