//! Collection of findings and execution details for a completed scan.

use crate::core::{
    ScanApi, ScanError, ScanId, ScanResults, SearchApi, SearchRequest, Vulnerability,
};
use crate::events::{EventSink, LifecycleEvent};

/// Builds the search query for a scan's findings.
///
/// A non-blank `filter` is ANDed onto the scan predicate verbatim; it is
/// not parsed or validated.
pub fn vulnerability_query(scan_id: &ScanId, filter: Option<&str>) -> String {
    let mut query = format!("vulnerability.scans.id='{}'", scan_id);

    if let Some(filter) = filter.map(str::trim).filter(|f| !f.is_empty()) {
        query.push_str(" && ");
        query.push_str(filter);
    }

    query
}

/// Gathers the results of a completed scan.
#[derive(Debug)]
pub struct ResultAggregator<'a> {
    scan_api: &'a dyn ScanApi,
    search_api: &'a dyn SearchApi,
    events: &'a dyn EventSink,
}

impl<'a> ResultAggregator<'a> {
    /// Creates an aggregator over the given services.
    pub fn new(
        scan_api: &'a dyn ScanApi,
        search_api: &'a dyn SearchApi,
        events: &'a dyn EventSink,
    ) -> Self {
        Self {
            scan_api,
            search_api,
            events,
        }
    }

    /// Fetches every finding of the scan matching `filter`, across all pages.
    pub async fn fetch_all(
        &self,
        scan_id: &ScanId,
        filter: Option<&str>,
    ) -> Result<Vec<Vulnerability>, ScanError> {
        let request = SearchRequest::vulnerabilities(vulnerability_query(scan_id, filter));

        self.events.emit(&LifecycleEvent::SearchingVulnerabilities {
            query: request.query.clone(),
        });

        self.search_api.search_all(&request).await
    }

    /// Fetches findings and execution details into one result bundle.
    pub async fn aggregate(
        &self,
        scan_id: &ScanId,
        filter: Option<&str>,
    ) -> Result<ScanResults, ScanError> {
        let vulnerabilities = self.fetch_all(scan_id, filter).await?;
        let execution_details = self.scan_api.get_execution_details(scan_id).await?;

        tracing::info!(
            scan_id = %scan_id,
            vulnerability_count = vulnerabilities.len(),
            "Scan results collected"
        );

        Ok(ScanResults::new(
            scan_id.clone(),
            vulnerabilities,
            execution_details,
        ))
    }
}
