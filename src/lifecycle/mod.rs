//! Scan lifecycle control.
//!
//! The [`ScanLifecycleController`] submits a scan and then polls it until
//! the status required by the caller's [`AdvanceLevel`] is observed. Each
//! poll cycle goes through the [`StatusPoller`], which tolerates up to
//! [`FAILURE_THRESHOLD`] consecutive transient failures, and the
//! [`DurationGuard`], which enforces the pending and executing ceilings.
//!
//! ## Phases
//!
//! - **Submitting**: the scan is created; failures are fatal.
//! - **Polling**: statuses are observed every [`POLL_INTERVAL`]. `FAILED`
//!   and `CANCELING` end the run before the target status is considered.
//! - **Aggregating**: findings and execution details are collected.
//! - **Finished**: results (if any) are returned.

mod advance;
mod controller;
mod duration;
mod poller;
mod sleeper;
mod state;

pub use advance::{AdvanceLevel, AdvancePolicy};
pub use controller::{ScanLifecycleController, ScanLifecycleControllerBuilder, POLL_INTERVAL};
pub use duration::{DurationBudget, DurationGuard};
pub use poller::{PollOutcome, StatusPoller, FAILURE_THRESHOLD};
pub use sleeper::{PollSleeper, TokioSleeper};
pub use state::{LifecyclePhase, StatusVerdict};
