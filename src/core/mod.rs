//! Core types and traits for the scanpilot library.
//!
//! This module provides the fundamental building blocks used throughout
//! the library:
//!
//! - [`types`] - Remote data such as `ScanId`, `ScanStatus`, `Vulnerability`
//! - [`traits`] - The `ScanApi` and `SearchApi` collaborator traits
//! - [`error`] - Structured error types
//! - [`result`] - Result bundles and search pages

pub mod error;
pub mod result;
pub mod traits;
pub mod types;

// Re-export commonly used types at the core level
pub use error::{DurationPhase, ScanError};
pub use result::{PageMetadata, ScanResults, SearchPage};
pub use traits::{ArcScanApi, ArcSearchApi, ScanApi, SearchApi, SearchRequest, SearchType};
pub use types::{
    Identifiable, RootCause, Scan, ScanExecutionDetails, ScanId, ScanStatus, Vulnerability,
};
