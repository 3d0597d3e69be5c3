//! Duration ceilings for the pending and executing phases of a scan.

use crate::core::{DurationPhase, ScanError, ScanStatus};

use std::time::Duration;
use tokio::time::Instant;

/// Optional ceilings for the two phases of a scan. `None` is unlimited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DurationBudget {
    /// Longest time the scan may stay pending, measured from submission.
    pub max_pending: Option<Duration>,
    /// Longest time the scan may execute, measured from when execution
    /// was first observed.
    pub max_executing: Option<Duration>,
}

impl DurationBudget {
    /// Creates a budget with no ceilings.
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Sets the pending ceiling.
    pub fn with_max_pending(mut self, limit: Duration) -> Self {
        self.max_pending = Some(limit);
        self
    }

    /// Sets the executing ceiling.
    pub fn with_max_executing(mut self, limit: Duration) -> Self {
        self.max_executing = Some(limit);
        self
    }

    /// Returns `true` if neither ceiling is set.
    pub fn is_unlimited(&self) -> bool {
        self.max_pending.is_none() && self.max_executing.is_none()
    }
}

/// Tracks elapsed time of one run against a [`DurationBudget`].
///
/// The pending clock starts at submission. The executing clock starts at
/// the first observation of a started status, so time spent queued does
/// not count against the execution ceiling.
#[derive(Debug, Clone)]
pub struct DurationGuard {
    budget: DurationBudget,
    submitted_at: Instant,
    execution_started_at: Option<Instant>,
}

impl DurationGuard {
    /// Creates a guard whose pending clock starts at `submitted_at`.
    pub fn new(submitted_at: Instant, budget: DurationBudget) -> Self {
        Self {
            budget,
            submitted_at,
            execution_started_at: None,
        }
    }

    /// Returns the budget being enforced.
    pub fn budget(&self) -> &DurationBudget {
        &self.budget
    }

    /// Returns when execution was first observed, if it has been.
    pub fn execution_started_at(&self) -> Option<Instant> {
        self.execution_started_at
    }

    /// Records an observed status without enforcing any ceiling.
    pub fn observe(&mut self, status: &ScanStatus) {
        self.observe_at(status, Instant::now());
    }

    /// Records `status` and enforces both ceilings at the current time.
    pub fn check(&mut self, status: &ScanStatus) -> Result<(), ScanError> {
        self.check_at(status, Instant::now())
    }

    pub(crate) fn observe_at(&mut self, status: &ScanStatus, now: Instant) {
        if self.execution_started_at.is_none() && status.has_started() {
            self.execution_started_at = Some(now);
        }
    }

    pub(crate) fn check_at(&mut self, status: &ScanStatus, now: Instant) -> Result<(), ScanError> {
        self.observe_at(status, now);
        self.check_pending(status, now)?;
        self.check_executing(status, now)
    }

    fn check_pending(&self, status: &ScanStatus, now: Instant) -> Result<(), ScanError> {
        let Some(limit) = self.budget.max_pending else {
            return Ok(());
        };
        if !status.is_pre_execution() {
            return Ok(());
        }

        let elapsed = now.saturating_duration_since(self.submitted_at);
        if elapsed > limit {
            return Err(ScanError::TimedOut {
                phase: DurationPhase::Pending,
                elapsed,
                limit,
            });
        }
        Ok(())
    }

    fn check_executing(&self, status: &ScanStatus, now: Instant) -> Result<(), ScanError> {
        let Some(limit) = self.budget.max_executing else {
            return Ok(());
        };
        let Some(started_at) = self.execution_started_at else {
            return Ok(());
        };
        if !status.has_started() {
            return Ok(());
        }

        let elapsed = now.saturating_duration_since(started_at);
        if elapsed > limit {
            return Err(ScanError::TimedOut {
                phase: DurationPhase::Executing,
                elapsed,
                limit,
            });
        }
        Ok(())
    }
}
