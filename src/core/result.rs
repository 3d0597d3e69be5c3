//! Result structures.
//!
//! This module defines `ScanResults`, the bundle handed back to the host
//! once a scan has completed, and `SearchPage`, one page of a search.

use crate::core::types::{ScanExecutionDetails, ScanId, Vulnerability};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Findings and execution details of a completed scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResults {
    /// The scan the results belong to.
    pub scan_id: ScanId,

    /// Every finding matching the search, fully materialized.
    pub vulnerabilities: Vec<Vulnerability>,

    /// Execution counters reported for the scan.
    pub execution_details: ScanExecutionDetails,

    /// When the results were collected.
    pub collected_at: DateTime<Utc>,
}

impl ScanResults {
    /// Creates a new result bundle.
    pub fn new(
        scan_id: ScanId,
        vulnerabilities: Vec<Vulnerability>,
        execution_details: ScanExecutionDetails,
    ) -> Self {
        Self {
            scan_id,
            vulnerabilities,
            execution_details,
            collected_at: Utc::now(),
        }
    }

    /// Returns the number of findings.
    pub fn vulnerability_count(&self) -> usize {
        self.vulnerabilities.len()
    }

    /// Returns `true` if no findings matched.
    pub fn is_empty(&self) -> bool {
        self.vulnerabilities.is_empty()
    }
}

/// Paging metadata returned by the search service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageMetadata {
    /// Zero-based index of this page.
    pub index: u32,
    /// Requested page size.
    pub size: u32,
    /// Total matching items across all pages.
    pub total_data: Option<u64>,
    /// Total number of pages.
    pub total_pages: Option<u32>,
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage<T> {
    /// Items on this page.
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    /// Paging metadata.
    #[serde(default)]
    pub metadata: PageMetadata,
}

impl<T> SearchPage<T> {
    /// Creates a page from items and the total page count.
    pub fn new(data: Vec<T>, index: u32, total_pages: u32) -> Self {
        Self {
            metadata: PageMetadata {
                index,
                size: data.len() as u32,
                total_data: None,
                total_pages: Some(total_pages),
            },
            data,
        }
    }

    /// Returns `true` if no further page should be requested after the
    /// page at `index`.
    ///
    /// Without a page count, a page holding fewer items than the page size
    /// is the last one.
    pub fn is_last(&self, index: u32) -> bool {
        if self.data.is_empty() {
            return true;
        }
        match self.metadata.total_pages {
            Some(total) => index + 1 >= total,
            None => self.metadata.size > 0 && self.data.len() < self.metadata.size as usize,
        }
    }
}
