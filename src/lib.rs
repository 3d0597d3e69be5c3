//! # Scanpilot
//!
//! Drives a remotely executed application security scan to a
//! caller-selected completion point, tolerating flaky status polling and
//! enforcing caller-supplied duration ceilings.
//!
//! ## Overview
//!
//! A build pipeline hands scanpilot a [`ScanRequest`] once per scan. The
//! [`ScanLifecycleController`] then:
//!
//! - Submits the scan (failures are fatal, never retried)
//! - Polls its status every 15 seconds, tolerating up to 20 consecutive
//!   failed polls
//! - Fails as soon as the scan reports `FAILED` or `CANCELING`
//! - Enforces optional pending and executing duration ceilings
//! - Collects findings and execution details when the scan completes
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use scanpilot::prelude::*;
//! use scanpilot::backends::{MockScanApi, MockSearchApi};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let controller = ScanLifecycleController::builder()
//!         .scan_api(MockScanApi::new().then_status(ScanStatus::Complete))
//!         .search_api(MockSearchApi::new())
//!         .build()?;
//!
//!     let request = ScanRequest::new("scan-config-id", AdvanceLevel::Completed);
//!     let results = controller.run(&request, &CancellationToken::new()).await?;
//!
//!     if let Some(results) = results {
//!         println!("{} vulnerabilities", results.vulnerability_count());
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `http` - Client for the platform's REST API via `reqwest`
//!
//! ## Architecture
//!
//! - **Core**: Remote data types, collaborator traits, and errors
//! - **Lifecycle**: Advance levels, polling, duration ceilings, and the controller
//! - **Results**: Query construction and result collection
//! - **Events**: Structured progress reporting
//! - **Backends**: Mock and HTTP implementations of the collaborator traits

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod backends;
pub mod config;
pub mod core;
pub mod events;
pub mod lifecycle;
pub mod results;

// Re-export commonly used types at the crate root
pub use crate::config::ScanRequest;
pub use crate::core::{
    DurationPhase, Scan, ScanApi, ScanError, ScanExecutionDetails, ScanId, ScanResults,
    ScanStatus, SearchApi, Vulnerability,
};
pub use crate::events::{EventSink, LifecycleEvent, TracingEventSink};
pub use crate::lifecycle::{AdvanceLevel, DurationBudget, ScanLifecycleController};
pub use crate::results::ResultAggregator;

/// Prelude module for convenient imports.
///
/// ```rust
/// use scanpilot::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::ScanRequest;
    pub use crate::core::{
        DurationPhase, Scan, ScanApi, ScanError, ScanExecutionDetails, ScanId, ScanResults,
        ScanStatus, SearchApi, Vulnerability,
    };
    pub use crate::events::{EventSink, LifecycleEvent, TracingEventSink};
    pub use crate::lifecycle::{AdvanceLevel, DurationBudget, ScanLifecycleController};
}
