//! Best-effort status polling with a consecutive-failure budget.

use crate::core::{Scan, ScanApi, ScanError, ScanId, ScanStatus};

/// Consecutive failed polls tolerated before a run is aborted.
///
/// At the fixed poll interval this is roughly five minutes of failures.
pub const FAILURE_THRESHOLD: u32 = 20;

/// Result of one poll attempt.
#[derive(Debug)]
pub enum PollOutcome {
    /// The service reported the scan's state.
    Observed(Scan),
    /// The attempt failed to communicate; the run may continue.
    Transient(ScanError),
}

impl PollOutcome {
    /// Returns the observed status, if any.
    pub fn status(&self) -> Option<&ScanStatus> {
        match self {
            Self::Observed(scan) => Some(&scan.status),
            Self::Transient(_) => None,
        }
    }
}

/// Polls one scan's status, counting consecutive failures.
///
/// A poller belongs to a single run; its failure count starts at zero
/// and resets on every successful poll, so only an unbroken streak of
/// failures exhausts the budget.
#[derive(Debug)]
pub struct StatusPoller<'a> {
    api: &'a dyn ScanApi,
    scan_id: &'a ScanId,
    consecutive_failures: u32,
    attempts: u64,
}

impl<'a> StatusPoller<'a> {
    /// Creates a poller for the given scan.
    pub fn new(api: &'a dyn ScanApi, scan_id: &'a ScanId) -> Self {
        Self {
            api,
            scan_id,
            consecutive_failures: 0,
            attempts: 0,
        }
    }

    /// Returns the current streak of failed polls.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Returns the number of polls issued so far.
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    /// Issues one status request.
    ///
    /// Any error from the service is reported as [`PollOutcome::Transient`]
    /// until the streak exceeds [`FAILURE_THRESHOLD`], at which point
    /// [`ScanError::PollingAborted`] is returned instead.
    pub async fn poll(&mut self) -> Result<PollOutcome, ScanError> {
        self.attempts += 1;
        let result = self.api.get_scan(self.scan_id).await;
        self.record(result)
    }

    fn record(&mut self, result: Result<Scan, ScanError>) -> Result<PollOutcome, ScanError> {
        match result {
            Ok(scan) => {
                self.consecutive_failures = 0;
                Ok(PollOutcome::Observed(scan))
            }
            Err(e) => {
                self.consecutive_failures += 1;

                if self.consecutive_failures > FAILURE_THRESHOLD {
                    return Err(ScanError::PollingAborted {
                        failures: self.consecutive_failures,
                        source: Box::new(e),
                    });
                }

                tracing::debug!(
                    scan_id = %self.scan_id,
                    failures = self.consecutive_failures,
                    threshold = FAILURE_THRESHOLD,
                    error = %e,
                    "Status poll failed"
                );
                Ok(PollOutcome::Transient(e))
            }
        }
    }
}
