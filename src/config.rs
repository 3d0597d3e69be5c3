//! Host-supplied configuration of a scan run.
//!
//! A [`ScanRequest`] is what a build pipeline hands over for one run. It
//! deserializes from JSON, with the two duration ceilings written as
//! human-readable strings such as `"30m"` or `"1h 15m"`.

use crate::core::ScanError;
use crate::lifecycle::{AdvanceLevel, DurationBudget};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::Duration;

/// Everything the host chooses for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRequest {
    /// Scan configuration to submit.
    pub scan_config_id: String,

    /// How far to advance before returning.
    pub advance_level: AdvanceLevel,

    /// Search-language filter narrowing the collected findings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vulnerability_query: Option<String>,

    /// Ceiling for the pending phase.
    #[serde(
        default,
        with = "optional_duration",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_scan_pending_duration: Option<Duration>,

    /// Ceiling for the executing phase.
    #[serde(
        default,
        with = "optional_duration",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_scan_execution_duration: Option<Duration>,
}

impl ScanRequest {
    /// Creates a request with no filter and no ceilings.
    pub fn new(scan_config_id: impl Into<String>, advance_level: AdvanceLevel) -> Self {
        Self {
            scan_config_id: scan_config_id.into(),
            advance_level,
            vulnerability_query: None,
            max_scan_pending_duration: None,
            max_scan_execution_duration: None,
        }
    }

    /// Parses and validates a request from JSON.
    pub fn from_json(json: &str) -> Result<Self, ScanError> {
        let request: Self = serde_json::from_str(json)
            .map_err(|e| ScanError::configuration(format!("invalid scan request: {}", e)))?;
        request.validate()?;
        Ok(request)
    }

    /// Sets the findings filter.
    pub fn with_vulnerability_query(mut self, query: impl Into<String>) -> Self {
        self.vulnerability_query = Some(query.into());
        self
    }

    /// Sets the pending ceiling.
    pub fn with_max_pending_duration(mut self, limit: Duration) -> Self {
        self.max_scan_pending_duration = Some(limit);
        self
    }

    /// Sets the executing ceiling.
    pub fn with_max_execution_duration(mut self, limit: Duration) -> Self {
        self.max_scan_execution_duration = Some(limit);
        self
    }

    /// Checks the request for values no run could use.
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.scan_config_id.trim().is_empty() {
            return Err(ScanError::configuration("scan config id must not be empty"));
        }
        Ok(())
    }

    /// Returns the duration ceilings of the request.
    pub fn budget(&self) -> DurationBudget {
        DurationBudget {
            max_pending: self.max_scan_pending_duration,
            max_executing: self.max_scan_execution_duration,
        }
    }
}

/// Parses a human-readable duration; blank input means "no ceiling".
pub fn parse_duration(input: &str) -> Result<Option<Duration>, ScanError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    humantime::parse_duration(trimmed)
        .map(Some)
        .map_err(|e| ScanError::configuration(format!("invalid duration '{}': {}", trimmed, e)))
}

mod optional_duration {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => s.serialize_str(&humantime::format_duration(*duration).to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw {
            Some(raw) => parse_duration(&raw).map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_full() {
        let request = ScanRequest::from_json(
            r#"{
                "scan_config_id": "cfg-1",
                "advance_level": "VULNERABILITY_RESULTS",
                "vulnerability_query": "vulnerability.severity='HIGH'",
                "max_scan_pending_duration": "30m",
                "max_scan_execution_duration": "1h 15m"
            }"#,
        )
        .unwrap();

        assert_eq!(request.advance_level, AdvanceLevel::CompletedWithResults);
        assert_eq!(
            request.budget(),
            DurationBudget {
                max_pending: Some(Duration::from_secs(30 * 60)),
                max_executing: Some(Duration::from_secs(75 * 60)),
            }
        );
    }

    #[test]
    fn test_blank_durations_are_unlimited() {
        let request = ScanRequest::from_json(
            r#"{
                "scan_config_id": "cfg-1",
                "advance_level": "SCAN_STARTED",
                "max_scan_pending_duration": "  "
            }"#,
        )
        .unwrap();

        assert!(request.budget().is_unlimited());
        assert_eq!(request.vulnerability_query, None);
    }

    #[test]
    fn test_invalid_requests_are_rejected() {
        let bad_duration = ScanRequest::from_json(
            r#"{"scan_config_id": "cfg-1", "advance_level": "SCAN_STARTED",
                "max_scan_execution_duration": "soon"}"#,
        );
        assert!(matches!(bad_duration, Err(ScanError::Configuration { .. })));

        let empty_id =
            ScanRequest::from_json(r#"{"scan_config_id": " ", "advance_level": "SCAN_STARTED"}"#);
        assert!(matches!(empty_id, Err(ScanError::Configuration { .. })));
    }

    #[test]
    fn test_serializes_durations_as_text() {
        let request = ScanRequest::new("cfg-1", AdvanceLevel::Completed)
            .with_max_pending_duration(Duration::from_secs(90));
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["max_scan_pending_duration"], "1m 30s");
        assert!(json.get("max_scan_execution_duration").is_none());
    }
}
