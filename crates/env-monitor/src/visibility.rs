//! Tab-visibility monitor
//!
//! Keyed off page visibility changes only. Raw focus/blur is deliberately not
//! accepted: embedded rich-text and code editors steal focus internally and
//! would manufacture false violations.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;
use violations::{Aggregator, ViolationId};

/// Page visibility transitions reported by the page collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilitySignal {
    Hidden,
    Visible,
}

/// Same shape as the fullscreen monitor: hidden opens a `TabSwitch` record,
/// visible patches it with the return time and duration.
pub struct TabVisibilityMonitor {
    aggregator: Arc<Aggregator>,
    open_switch: Option<ViolationId>,
}

impl TabVisibilityMonitor {
    pub fn new(aggregator: Arc<Aggregator>) -> Self {
        Self {
            aggregator,
            open_switch: None,
        }
    }

    /// Feed one visibility transition. Duplicate transitions are ignored.
    pub fn handle_signal(&mut self, signal: VisibilitySignal, at: DateTime<Utc>) {
        match signal {
            VisibilitySignal::Hidden => {
                if self.open_switch.is_some() {
                    debug!("duplicate hidden signal ignored");
                    return;
                }
                self.open_switch = Some(self.aggregator.record_tab_hidden(at));
            }
            VisibilitySignal::Visible => {
                if let Some(id) = self.open_switch.take() {
                    self.aggregator.record_tab_visible(id, at);
                }
            }
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.open_switch.is_some()
    }
}
