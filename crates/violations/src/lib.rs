//! Violation Ledger and Aggregation
//!
//! Shared data model for proctoring integrity violations:
//! - Closed violation taxonomy with wire-stable serialization
//! - Append-only, partitioned violation ledger
//! - Aggregator with a typed broadcast event stream and one-shot threshold latch
//! - Session metadata projection for the grading backend

pub mod aggregator;
pub mod ledger;
pub mod metadata;
pub mod types;

pub use aggregator::{Aggregator, ProctorEvent};
pub use ledger::{LedgerSnapshot, ViolationId, ViolationLedger};
pub use metadata::{MetadataError, ProctoringReport, SessionMetadata, SessionTiming};
pub use types::{DetectionStatus, Severity, Violation, ViolationType};
