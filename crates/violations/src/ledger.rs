//! Append-only, partitioned violation ledger

use std::collections::HashMap;

use crate::types::{Violation, ViolationType};

/// Ledger partition a violation was appended to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Partition {
    Face,
    TabSwitch,
    Fullscreen,
}

/// Handle to a previously appended violation, used to patch paired records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViolationId {
    partition: Partition,
    index: usize,
}

/// Append-only record of all violations in a session.
///
/// Partitioned into face, tab-switch, and fullscreen violations; the total
/// count is always the sum of the partition lengths. Records are never
/// removed except by an explicit `clear`.
#[derive(Debug, Default)]
pub struct ViolationLedger {
    face: Vec<Violation>,
    tab_switches: Vec<Violation>,
    fullscreen_exits: Vec<Violation>,
}

/// Point-in-time copy of the ledger contents
#[derive(Debug, Clone)]
pub struct LedgerSnapshot {
    pub face: Vec<Violation>,
    pub tab_switches: Vec<Violation>,
    pub fullscreen_exits: Vec<Violation>,
    pub total: usize,
}

impl ViolationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a face-track violation
    pub fn push_face(&mut self, violation: Violation) -> ViolationId {
        self.face.push(violation);
        ViolationId {
            partition: Partition::Face,
            index: self.face.len() - 1,
        }
    }

    /// Append a tab-switch violation
    pub fn push_tab_switch(&mut self, violation: Violation) -> ViolationId {
        self.tab_switches.push(violation);
        ViolationId {
            partition: Partition::TabSwitch,
            index: self.tab_switches.len() - 1,
        }
    }

    /// Append a fullscreen-exit violation
    pub fn push_fullscreen(&mut self, violation: Violation) -> ViolationId {
        self.fullscreen_exits.push(violation);
        ViolationId {
            partition: Partition::Fullscreen,
            index: self.fullscreen_exits.len() - 1,
        }
    }

    /// Look up a record for patching (stale ids after `clear` return None)
    pub fn get_mut(&mut self, id: ViolationId) -> Option<&mut Violation> {
        match id.partition {
            Partition::Face => self.face.get_mut(id.index),
            Partition::TabSwitch => self.tab_switches.get_mut(id.index),
            Partition::Fullscreen => self.fullscreen_exits.get_mut(id.index),
        }
    }

    pub fn total(&self) -> usize {
        self.face.len() + self.tab_switches.len() + self.fullscreen_exits.len()
    }

    /// Per-type violation counts across all partitions
    pub fn statistics(&self) -> HashMap<ViolationType, usize> {
        let mut counts = HashMap::new();
        for v in self
            .face
            .iter()
            .chain(self.tab_switches.iter())
            .chain(self.fullscreen_exits.iter())
        {
            *counts.entry(v.violation_type).or_insert(0) += 1;
        }
        counts
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            face: self.face.clone(),
            tab_switches: self.tab_switches.clone(),
            fullscreen_exits: self.fullscreen_exits.clone(),
            total: self.total(),
        }
    }

    /// Explicit operator reset; the only way records leave the ledger
    pub fn clear(&mut self) {
        self.face.clear();
        self.tab_switches.clear();
        self.fullscreen_exits.clear();
    }
}
