//! Advance levels: how far a run waits before handing control back.

use crate::core::{ScanError, ScanStatus};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How far the controller advances a scan before returning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdvanceLevel {
    /// Return as soon as the scan has been submitted.
    #[serde(rename = "SCAN_SUBMITTED")]
    Submitted,
    /// Wait until the scan is running.
    #[serde(rename = "SCAN_STARTED")]
    Started,
    /// Wait until the scan is complete and collect all of its findings.
    #[serde(rename = "SCAN_COMPLETED")]
    Completed,
    /// Wait until the scan is complete and collect the findings matching
    /// the caller's query.
    #[serde(rename = "VULNERABILITY_RESULTS")]
    CompletedWithResults,
}

impl AdvanceLevel {
    /// All levels, from least to most blocking.
    pub const ALL: [AdvanceLevel; 4] = [
        Self::Submitted,
        Self::Started,
        Self::Completed,
        Self::CompletedWithResults,
    ];

    /// Returns the identifier used in host configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "SCAN_SUBMITTED",
            Self::Started => "SCAN_STARTED",
            Self::Completed => "SCAN_COMPLETED",
            Self::CompletedWithResults => "VULNERABILITY_RESULTS",
        }
    }

    /// Returns the label shown in progress logs.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Submitted => "Scan has been submitted",
            Self::Started => "Scan has been started",
            Self::Completed => "Scan has been completed",
            Self::CompletedWithResults => "Vulnerability query has returned results",
        }
    }

    /// Returns what the controller has to do for this level.
    pub fn policy(&self) -> AdvancePolicy {
        match self {
            Self::Submitted => AdvancePolicy {
                target: None,
                collect_results: false,
                apply_query: false,
            },
            Self::Started => AdvancePolicy {
                target: Some(ScanStatus::Running),
                collect_results: false,
                apply_query: false,
            },
            Self::Completed => AdvancePolicy {
                target: Some(ScanStatus::Complete),
                collect_results: true,
                apply_query: false,
            },
            Self::CompletedWithResults => AdvancePolicy {
                target: Some(ScanStatus::Complete),
                collect_results: true,
                apply_query: true,
            },
        }
    }
}

impl fmt::Display for AdvanceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdvanceLevel {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ScanError::configuration(format!("unknown advance level '{}'", wanted)))
    }
}

/// The controller's obligations for one advance level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvancePolicy {
    /// Status to wait for; `None` returns right after submission.
    pub target: Option<ScanStatus>,
    /// Whether findings and execution details are collected at the end.
    pub collect_results: bool,
    /// Whether the caller's query narrows the collected findings.
    pub apply_query: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_table() {
        let submitted = AdvanceLevel::Submitted.policy();
        assert_eq!(submitted.target, None);
        assert!(!submitted.collect_results);

        let started = AdvanceLevel::Started.policy();
        assert_eq!(started.target, Some(ScanStatus::Running));
        assert!(!started.collect_results);

        let completed = AdvanceLevel::Completed.policy();
        assert_eq!(completed.target, Some(ScanStatus::Complete));
        assert!(completed.collect_results);
        assert!(!completed.apply_query);

        let with_results = AdvanceLevel::CompletedWithResults.policy();
        assert_eq!(with_results.target, Some(ScanStatus::Complete));
        assert!(with_results.apply_query);
    }

    #[test]
    fn test_parse_advance_level() {
        assert_eq!(
            "scan_started".parse::<AdvanceLevel>().unwrap(),
            AdvanceLevel::Started
        );
        assert_eq!(
            " VULNERABILITY_RESULTS ".parse::<AdvanceLevel>().unwrap(),
            AdvanceLevel::CompletedWithResults
        );
        assert!("SCAN_FINISHED".parse::<AdvanceLevel>().is_err());
    }

    #[test]
    fn test_serde_names_match_identifiers() {
        for level in AdvanceLevel::ALL {
            let json = serde_json::to_string(&level).unwrap();
            assert_eq!(json, format!("\"{}\"", level.as_str()));
        }
    }
}
