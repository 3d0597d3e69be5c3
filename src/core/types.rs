//! Core types used throughout the scanpilot library.
//!
//! This module defines the data structures exchanged with the remote scan
//! and search services: scan handles, scan statuses, vulnerabilities, and
//! execution details.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Opaque identifier of a submitted remote scan.
///
/// Obtained once from a successful submission and never re-submitted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanId(String);

impl ScanId {
    /// Creates a scan id from its string form.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Extracts the scan id from a location-style reference such as
    /// `https://host/ias/v1/scans/{id}`.
    ///
    /// Returns `None` when no non-empty path segment is present.
    pub fn from_location(location: &str) -> Option<Self> {
        let path = location.split(['?', '#']).next().unwrap_or_default();
        path.rsplit('/')
            .map(str::trim)
            .find(|segment| !segment.is_empty())
            .filter(|segment| !segment.ends_with(':'))
            .map(Self::new)
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Status of a remote scan as reported by the scan service.
///
/// Statuses the library does not know about are kept verbatim in
/// [`ScanStatus::Other`] and are never treated as terminal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ScanStatus {
    /// Waiting in the remote queue.
    Queued,
    /// Accepted but not yet executing.
    Pending,
    /// Executing.
    Running,
    /// Execution is being paused.
    Pausing,
    /// Execution is paused.
    Paused,
    /// Execution is resuming after a pause.
    Resuming,
    /// The scan is being cancelled.
    Canceling,
    /// The scan finished.
    Complete,
    /// The scan failed.
    Failed,
    /// Any other status reported by the remote service.
    Other(String),
}

impl ScanStatus {
    /// Returns the wire name of the status.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Queued => "QUEUED",
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Pausing => "PAUSING",
            Self::Paused => "PAUSED",
            Self::Resuming => "RESUMING",
            Self::Canceling => "CANCELING",
            Self::Complete => "COMPLETE",
            Self::Failed => "FAILED",
            Self::Other(other) => other,
        }
    }

    /// Returns `true` for statuses that end the run with a failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::Canceling)
    }

    /// Returns `true` while the scan has not started executing.
    pub fn is_pre_execution(&self) -> bool {
        matches!(self, Self::Queued | Self::Pending)
    }

    /// Returns `true` once the scan has started executing (or moved past it).
    pub fn has_started(&self) -> bool {
        matches!(
            self,
            Self::Running
                | Self::Pausing
                | Self::Paused
                | Self::Resuming
                | Self::Canceling
                | Self::Complete
                | Self::Failed
        )
    }
}

impl From<String> for ScanStatus {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "QUEUED" => Self::Queued,
            "PENDING" => Self::Pending,
            "RUNNING" => Self::Running,
            "PAUSING" => Self::Pausing,
            "PAUSED" => Self::Paused,
            "RESUMING" => Self::Resuming,
            "CANCELING" => Self::Canceling,
            "COMPLETE" => Self::Complete,
            "FAILED" => Self::Failed,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for ScanStatus {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<ScanStatus> for String {
    fn from(status: ScanStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reference to another remote resource by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifiable {
    /// Id of the referenced resource.
    pub id: String,
}

impl Identifiable {
    /// Creates a new reference.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// A remote scan as returned by the scan service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scan {
    /// Scan id.
    pub id: ScanId,

    /// Current status.
    pub status: ScanStatus,

    /// Scan configuration the scan was submitted for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_config: Option<Identifiable>,

    /// Application the scan belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app: Option<Identifiable>,

    /// When the scan was submitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submit_time: Option<DateTime<Utc>>,

    /// When the scan finished, if it has.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_time: Option<DateTime<Utc>>,
}

impl Scan {
    /// Creates a scan with the given id and status.
    pub fn new(id: ScanId, status: ScanStatus) -> Self {
        Self {
            id,
            status,
            scan_config: None,
            app: None,
            submit_time: None,
            completion_time: None,
        }
    }

    /// Sets the scan configuration reference.
    pub fn with_scan_config(mut self, scan_config_id: impl Into<String>) -> Self {
        self.scan_config = Some(Identifiable::new(scan_config_id));
        self
    }
}

/// Crawl and attack counters recorded by the remote scan engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanExecutionDetails {
    /// Whether the scan engine managed to log in to the target.
    pub logged_in: Option<bool>,
    /// Links waiting to be crawled.
    pub links_in_queue: Option<u64>,
    /// Links crawled.
    pub links_crawled: Option<u64>,
    /// Attacks waiting to be run.
    pub attacks_in_queue: Option<u64>,
    /// Attacks run.
    pub attacked: Option<u64>,
    /// Requests that produced a finding.
    pub vulnerable_requests: Option<u64>,
    /// Total requests issued.
    pub requests: Option<u64>,
    /// Requests that failed.
    pub failed_requests: Option<u64>,
    /// Configured network speed.
    pub network_speed: Option<u64>,
    /// Delay between requests in milliseconds.
    pub drip_delay: Option<u64>,
}

/// The request that triggered a finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootCause {
    /// Target URL.
    pub url: String,
    /// Vulnerable parameter, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
    /// HTTP method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

/// A single finding returned by the search service.
///
/// Fields the library does not model are preserved in `details`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vulnerability {
    /// Finding id.
    pub id: String,

    /// Severity as reported (e.g. `HIGH`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,

    /// Triage status (e.g. `UNREVIEWED`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Request that triggered the finding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_cause: Option<RootCause>,

    /// First time the finding was seen.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_discovered: Option<DateTime<Utc>>,

    /// Most recent time the finding was seen.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_discovered: Option<DateTime<Utc>>,

    /// Remaining remote attributes.
    #[serde(flatten)]
    pub details: HashMap<String, serde_json::Value>,
}

impl Vulnerability {
    /// Creates a vulnerability with only an id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            severity: None,
            status: None,
            root_cause: None,
            first_discovered: None,
            last_discovered: None,
            details: HashMap::new(),
        }
    }

    /// Sets the severity.
    pub fn with_severity(mut self, severity: impl Into<String>) -> Self {
        self.severity = Some(severity.into());
        self
    }
}
