//! Collaborator traits for the remote scan and search services.
//!
//! The lifecycle controller only talks to the outside world through these
//! traits, so transports (HTTP, in-memory mocks) are interchangeable.

use crate::core::error::ScanError;
use crate::core::result::SearchPage;
use crate::core::types::{Scan, ScanExecutionDetails, ScanId, Vulnerability};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;

/// The remote scan-management service.
///
/// # Implementation Notes
///
/// - Implementations must be `Send + Sync`; one instance may serve many
///   concurrent runs, so it must not keep per-run mutable state.
/// - `submit_scan` must map every failure, transport or non-success
///   status, to [`ScanError::SubmissionFailed`].
/// - `get_scan` may return any error; the poller treats all of them as
///   transient.
#[async_trait]
pub trait ScanApi: Send + Sync + Debug {
    /// Submits a new scan for the given scan configuration.
    async fn submit_scan(&self, scan_config_id: &str) -> Result<ScanId, ScanError>;

    /// Fetches the current state of a scan.
    async fn get_scan(&self, scan_id: &ScanId) -> Result<Scan, ScanError>;

    /// Fetches the execution counters of a scan.
    async fn get_execution_details(
        &self,
        scan_id: &ScanId,
    ) -> Result<ScanExecutionDetails, ScanError>;
}

/// Kind of resource a search targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SearchType {
    /// Vulnerability findings.
    Vulnerability,
}

/// A search in the service's native query language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Resource type to search.
    #[serde(rename = "type")]
    pub search_type: SearchType,
    /// Query string.
    pub query: String,
}

impl SearchRequest {
    /// Creates a vulnerability search.
    pub fn vulnerabilities(query: impl Into<String>) -> Self {
        Self {
            search_type: SearchType::Vulnerability,
            query: query.into(),
        }
    }
}

/// The remote search service.
#[async_trait]
pub trait SearchApi: Send + Sync + Debug {
    /// Fetches one page of results, `index` being zero-based.
    async fn search_page(
        &self,
        request: &SearchRequest,
        index: u32,
    ) -> Result<SearchPage<Vulnerability>, ScanError>;

    /// Fetches every page of results and returns them in page order.
    ///
    /// Stops after the last page reported by the service. Without a page
    /// count it stops at the first empty or short page, or when the
    /// service answers with an earlier page than the one requested.
    async fn search_all(&self, request: &SearchRequest) -> Result<Vec<Vulnerability>, ScanError> {
        let mut results = Vec::new();
        let mut index = 0;

        loop {
            let page = self.search_page(request, index).await?;

            if page.metadata.index < index {
                tracing::warn!(
                    query = %request.query,
                    requested = index,
                    returned = page.metadata.index,
                    "Search page index did not advance, stopping"
                );
                break;
            }

            let is_last = page.is_last(index);
            results.extend(page.data);

            if is_last {
                break;
            }
            index += 1;
        }

        tracing::debug!(
            query = %request.query,
            pages = index + 1,
            total = results.len(),
            "Search exhausted"
        );

        Ok(results)
    }
}

/// Type alias for a shareable scan API.
pub type ArcScanApi = Arc<dyn ScanApi>;

/// Type alias for a shareable search API.
pub type ArcSearchApi = Arc<dyn SearchApi>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::result::PageMetadata;

    /// Answers every request with the same page and no page count.
    #[derive(Debug)]
    struct StuckSearch {
        size: u32,
        items: usize,
    }

    #[async_trait]
    impl SearchApi for StuckSearch {
        async fn search_page(
            &self,
            _request: &SearchRequest,
            _index: u32,
        ) -> Result<SearchPage<Vulnerability>, ScanError> {
            Ok(SearchPage {
                data: (0..self.items)
                    .map(|i| Vulnerability::new(format!("v-{}", i)))
                    .collect(),
                metadata: PageMetadata {
                    index: 0,
                    size: self.size,
                    total_data: None,
                    total_pages: None,
                },
            })
        }
    }

    #[tokio::test]
    async fn test_search_all_stops_when_index_does_not_advance() {
        let search = StuckSearch { size: 2, items: 2 };
        let results = search
            .search_all(&SearchRequest::vulnerabilities("q"))
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_search_all_stops_on_short_page() {
        let search = StuckSearch { size: 10, items: 3 };
        let results = search
            .search_all(&SearchRequest::vulnerabilities("q"))
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
    }
}
