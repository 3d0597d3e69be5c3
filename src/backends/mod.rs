//! Collaborator implementations.
//!
//! This module contains implementations of the `ScanApi` and `SearchApi`
//! traits.
//!
//! ## Available Backends
//!
//! - [`mock`] - Scripted in-memory services for testing
//! - [`http`] - The platform's REST API (requires `http` feature)
//!
//! ## Implementing a Custom Backend
//!
//! ```rust,ignore
//! use scanpilot::core::{Scan, ScanApi, ScanError, ScanExecutionDetails, ScanId};
//! use async_trait::async_trait;
//!
//! #[derive(Debug)]
//! pub struct MyScanService;
//!
//! #[async_trait]
//! impl ScanApi for MyScanService {
//!     async fn submit_scan(&self, scan_config_id: &str) -> Result<ScanId, ScanError> {
//!         todo!()
//!     }
//!
//!     async fn get_scan(&self, scan_id: &ScanId) -> Result<Scan, ScanError> {
//!         todo!()
//!     }
//!
//!     async fn get_execution_details(
//!         &self,
//!         scan_id: &ScanId,
//!     ) -> Result<ScanExecutionDetails, ScanError> {
//!         todo!()
//!     }
//! }
//! ```

pub mod mock;

#[cfg(feature = "http")]
pub mod http;

// Re-exports
pub use mock::{MockScanApi, MockSearchApi, RecordingEventSink, RecordingSleeper};

#[cfg(feature = "http")]
pub use http::{HttpClientConfig, InsightApiClient};
