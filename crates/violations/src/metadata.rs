//! Session metadata projection
//!
//! Builds the exact structure the grading backend expects. The field layout
//! here is a wire contract; renaming or reordering fields breaks submission.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ledger::LedgerSnapshot;
use crate::types::Violation;

#[derive(Error, Debug)]
pub enum MetadataError {
    /// Submission timestamp precedes the session start. Clock skew is not
    /// corrected here; the caller must treat the record as suspect.
    #[error("submitted_at {submitted_at} precedes started_at {started_at}")]
    ClockSkew {
        started_at: DateTime<Utc>,
        submitted_at: DateTime<Utc>,
    },
}

/// Proctoring section of the submission payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProctoringReport {
    pub face_violations: Vec<Violation>,
    pub tab_switches: Vec<Violation>,
    pub fullscreen_exits: Vec<Violation>,
    pub total_violation_count: usize,
    pub violation_threshold_reached: bool,
}

/// Timing section of the submission payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTiming {
    pub started_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_time_seconds: Option<i64>,
}

/// The sole artifact handed to the submission collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub proctoring: ProctoringReport,
    pub timing: SessionTiming,
}

impl SessionMetadata {
    /// Project a ledger snapshot into the submission shape.
    ///
    /// Before submission pass `submitted_at = None`; the timing section then
    /// carries only the start time. At submission the duration is stamped as
    /// whole seconds of `submitted_at - started_at`.
    pub fn build(
        snapshot: LedgerSnapshot,
        threshold_reached: bool,
        started_at: DateTime<Utc>,
        submitted_at: Option<DateTime<Utc>>,
    ) -> Result<Self, MetadataError> {
        let total_time_seconds = match submitted_at {
            Some(submitted) => {
                let elapsed = (submitted - started_at).num_seconds();
                if elapsed < 0 {
                    return Err(MetadataError::ClockSkew {
                        started_at,
                        submitted_at: submitted,
                    });
                }
                Some(elapsed)
            }
            None => None,
        };

        Ok(Self {
            proctoring: ProctoringReport {
                total_violation_count: snapshot.total,
                face_violations: snapshot.face,
                tab_switches: snapshot.tab_switches,
                fullscreen_exits: snapshot.fullscreen_exits,
                violation_threshold_reached: threshold_reached,
            },
            timing: SessionTiming {
                started_at,
                submitted_at,
                total_time_seconds,
            },
        })
    }
}
