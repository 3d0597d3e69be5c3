//! Progress event types and the sinks that receive them.

use crate::core::{ScanError, ScanId, ScanStatus};
use crate::lifecycle::AdvanceLevel;

use serde::{Deserialize, Serialize};
use std::fmt;

/// A progress event emitted during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// A scan is about to be submitted.
    SubmittingScan {
        /// Scan configuration being submitted.
        scan_config_id: String,
    },
    /// The scan was accepted.
    ScanSubmitted {
        /// Id of the new scan.
        scan_id: ScanId,
    },
    /// The remote service assigned the scan its id.
    ScanIdAssigned {
        /// Id of the new scan.
        scan_id: ScanId,
    },
    /// The run's advance level.
    AdvanceLevelSelected {
        /// Selected level.
        level: AdvanceLevel,
    },
    /// The poll loop has started.
    PollingStarted {
        /// Polled scan.
        scan_id: ScanId,
    },
    /// A status was observed for the first time in the run.
    StatusObserved {
        /// Observed status.
        status: ScanStatus,
    },
    /// The observed status differs from the previous one.
    StatusChanged {
        /// Previous status.
        from: ScanStatus,
        /// New status.
        to: ScanStatus,
    },
    /// The desired status was reached.
    TargetReached {
        /// The reached status.
        status: ScanStatus,
    },
    /// The run is failing because of the scan's status.
    ScanFailing {
        /// Failure status.
        status: ScanStatus,
    },
    /// Findings are being searched.
    SearchingVulnerabilities {
        /// The search query.
        query: String,
    },
    /// The run ended with an error.
    RunAborted {
        /// Rendered error.
        error: String,
    },
}

impl LifecycleEvent {
    /// Returns the event type name.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::SubmittingScan { .. } => "submitting_scan",
            Self::ScanSubmitted { .. } => "scan_submitted",
            Self::ScanIdAssigned { .. } => "scan_id_assigned",
            Self::AdvanceLevelSelected { .. } => "advance_level_selected",
            Self::PollingStarted { .. } => "polling_started",
            Self::StatusObserved { .. } => "status_observed",
            Self::StatusChanged { .. } => "status_changed",
            Self::TargetReached { .. } => "target_reached",
            Self::ScanFailing { .. } => "scan_failing",
            Self::SearchingVulnerabilities { .. } => "searching_vulnerabilities",
            Self::RunAborted { .. } => "run_aborted",
        }
    }

    /// Returns `true` for events that report a failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::ScanFailing { .. } | Self::RunAborted { .. })
    }

    pub(crate) fn aborted(error: &ScanError) -> Self {
        Self::RunAborted {
            error: error.to_string(),
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SubmittingScan { scan_config_id } => {
                write!(f, "Submitting scan for scan config with id: {}", scan_config_id)
            }
            Self::ScanSubmitted { .. } => write!(f, "Scan submitted successfully"),
            Self::ScanIdAssigned { scan_id } => write!(f, "Scan id: {}", scan_id),
            Self::AdvanceLevelSelected { level } => {
                write!(f, "Using advance level: '{}'", level.display_name())
            }
            Self::PollingStarted { scan_id } => {
                write!(f, "Beginning polling for scan with id: {}", scan_id)
            }
            Self::StatusObserved { status } => write!(f, "Scan status: {}", status),
            Self::StatusChanged { from, to } => {
                write!(f, "Scan status has been updated from {} to {}", from, to)
            }
            Self::TargetReached { .. } => write!(f, "Desired scan status has been reached"),
            Self::ScanFailing { status } => write!(f, "Failing scan due to status: {}", status),
            Self::SearchingVulnerabilities { query } => {
                write!(f, "Searching for vulnerabilities using query [{}]", query)
            }
            Self::RunAborted { error } => write!(f, "Scan run aborted: {}", error),
        }
    }
}

/// Receives progress events. Purely observational.
pub trait EventSink: Send + Sync + fmt::Debug {
    /// Records one event.
    fn emit(&self, event: &LifecycleEvent);
}

/// Emits progress events through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: &LifecycleEvent) {
        if event.is_failure() {
            tracing::warn!(
                target: "scanpilot::progress",
                event_type = event.event_type(),
                "{}",
                event
            );
        } else {
            tracing::info!(
                target: "scanpilot::progress",
                event_type = event.event_type(),
                "{}",
                event
            );
        }
    }
}
