//! Error types for the scanpilot library.
//!
//! This module provides structured, typed errors for every way a scan run
//! can end early. The library never panics; all errors are returned as
//! `Result` values.

use crate::core::types::ScanStatus;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Which duration ceiling a timed-out scan breached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DurationPhase {
    /// Time spent before execution started.
    Pending,
    /// Time spent since execution started.
    Executing,
}

impl fmt::Display for DurationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Executing => write!(f, "executing"),
        }
    }
}

/// The main error type for scan operations.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The scan could not be submitted.
    #[error("error occurred submitting scan: {reason}")]
    SubmissionFailed {
        /// Human-readable reason for the failure.
        reason: String,
    },

    /// The remote scan reached a failure status.
    #[error("scan has failed. status: {status}")]
    ScanFailed {
        /// The failure status that was observed.
        status: ScanStatus,
    },

    /// Too many consecutive status polls failed.
    #[error("scan polling has failed {failures} times, aborting")]
    PollingAborted {
        /// Number of consecutive failures, including the one that aborted.
        failures: u32,
        /// The last transient error.
        #[source]
        source: Box<ScanError>,
    },

    /// A duration ceiling was breached.
    #[error("scan exceeded its maximum {phase} duration of {limit:?} (elapsed {elapsed:?})")]
    TimedOut {
        /// Which ceiling was breached.
        phase: DurationPhase,
        /// Time spent in the phase when the breach was detected.
        elapsed: Duration,
        /// The configured ceiling.
        limit: Duration,
    },

    /// The run was cancelled by the host.
    #[error("scan run was cancelled")]
    Cancelled,

    /// Failed to reach a remote service.
    #[error("connection to {service} service failed: {message}")]
    ConnectionFailed {
        /// Name of the remote service.
        service: String,
        /// Error message describing the failure.
        message: String,
    },

    /// A remote service answered with an unexpected HTTP status.
    #[error("{service} service responded with status {status}: {body}")]
    UnexpectedStatus {
        /// Name of the remote service.
        service: String,
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// A remote service returned a response that could not be interpreted.
    #[error("ambiguous response from {service} service: {details}")]
    AmbiguousResponse {
        /// Name of the remote service.
        service: String,
        /// Details about the ambiguity.
        details: String,
    },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },
}

impl ScanError {
    /// Returns `true` if this error ends a run outright.
    ///
    /// Non-fatal errors come from a single remote call and are only
    /// fatal when they happen at submission or exhaust the poll budget.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::SubmissionFailed { .. }
                | Self::ScanFailed { .. }
                | Self::PollingAborted { .. }
                | Self::TimedOut { .. }
                | Self::Cancelled
                | Self::Configuration { .. }
        )
    }

    /// Returns the failure status if the remote scan failed.
    pub fn failed_status(&self) -> Option<&ScanStatus> {
        match self {
            Self::ScanFailed { status } => Some(status),
            _ => None,
        }
    }

    /// Creates a `SubmissionFailed` error.
    pub fn submission_failed(reason: impl Into<String>) -> Self {
        Self::SubmissionFailed {
            reason: reason.into(),
        }
    }

    /// Creates a `ConnectionFailed` error.
    pub fn connection_failed(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Creates an `AmbiguousResponse` error.
    pub fn ambiguous_response(service: impl Into<String>, details: impl Into<String>) -> Self {
        Self::AmbiguousResponse {
            service: service.into(),
            details: details.into(),
        }
    }

    /// Creates a `Configuration` error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}
