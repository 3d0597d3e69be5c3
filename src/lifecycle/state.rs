//! Run phases and the per-status verdict of the poll loop.

use crate::core::{ScanId, ScanResults, ScanStatus};

use tokio::time::Instant;

/// What a freshly observed status means for the poll loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusVerdict {
    /// The scan failed; the run must stop with an error.
    Failed(ScanStatus),
    /// The desired status was reached.
    Reached,
    /// Keep polling.
    Continue,
}

impl StatusVerdict {
    /// Classifies `status` against the desired `target`.
    ///
    /// Failure statuses win over the target, so a run waiting for a
    /// failure status can never succeed on it.
    pub fn evaluate(status: &ScanStatus, target: &ScanStatus) -> Self {
        if status.is_failure() {
            Self::Failed(status.clone())
        } else if status == target {
            Self::Reached
        } else {
            Self::Continue
        }
    }

    /// Returns the name of the verdict.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Failed(_) => "failed",
            Self::Reached => "reached",
            Self::Continue => "continue",
        }
    }
}

/// The phases of one run, in order.
#[derive(Debug)]
pub enum LifecyclePhase {
    /// The scan has not been submitted yet.
    Submitting,
    /// Polling until `target` is observed.
    Polling {
        /// The submitted scan.
        scan_id: ScanId,
        /// Status that ends the poll loop.
        target: ScanStatus,
        /// When the scan was submitted; starts the pending clock.
        submitted_at: Instant,
    },
    /// Collecting findings and execution details.
    Aggregating {
        /// The completed scan.
        scan_id: ScanId,
        /// Query narrowing the findings, if any.
        query: Option<String>,
    },
    /// The run is over.
    Finished(Option<ScanResults>),
}

impl LifecyclePhase {
    /// Returns the name of the phase.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Submitting => "submitting",
            Self::Polling { .. } => "polling",
            Self::Aggregating { .. } => "aggregating",
            Self::Finished(_) => "finished",
        }
    }
}
