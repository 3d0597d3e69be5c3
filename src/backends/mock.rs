//! In-memory collaborators for testing.
//!
//! This module provides scripted scan and search services, plus a
//! recording event sink and sleeper, so runs can be exercised without a
//! remote service or real waiting.

use crate::core::{
    Scan, ScanApi, ScanError, ScanExecutionDetails, ScanId, ScanStatus, SearchApi, SearchPage,
    SearchRequest, Vulnerability,
};
use crate::events::{EventSink, LifecycleEvent};
use crate::lifecycle::{PollSleeper, TokioSleeper};

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Clone)]
enum SubmitBehavior {
    Accept,
    Reject(String),
    Unreachable(String),
}

/// A scan service that answers status polls from a script.
///
/// Each poll consumes one scripted entry: a status, or a transient
/// failure. Once the script is exhausted the last entry repeats.
///
/// # Examples
///
/// ```rust
/// use scanpilot::backends::MockScanApi;
/// use scanpilot::core::ScanStatus;
///
/// let api = MockScanApi::new()
///     .then_status(ScanStatus::Pending)
///     .then_fail_times(3)
///     .then_status(ScanStatus::Complete);
/// ```
#[derive(Debug)]
pub struct MockScanApi {
    scan_id: ScanId,
    submit: SubmitBehavior,
    script: Mutex<VecDeque<Option<ScanStatus>>>,
    last: Mutex<Option<Option<ScanStatus>>>,
    execution_details: ScanExecutionDetails,
    submit_count: AtomicU64,
    poll_count: AtomicU64,
}

impl MockScanApi {
    /// Creates a mock that accepts submissions and has an empty script.
    pub fn new() -> Self {
        Self {
            scan_id: ScanId::new("mock-scan"),
            submit: SubmitBehavior::Accept,
            script: Mutex::new(VecDeque::new()),
            last: Mutex::new(None),
            execution_details: ScanExecutionDetails::default(),
            submit_count: AtomicU64::new(0),
            poll_count: AtomicU64::new(0),
        }
    }

    /// Sets the id returned by submissions.
    pub fn with_scan_id(mut self, scan_id: ScanId) -> Self {
        self.scan_id = scan_id;
        self
    }

    /// Makes submissions answer with a non-success response.
    pub fn with_rejected_submission(mut self, reason: impl Into<String>) -> Self {
        self.submit = SubmitBehavior::Reject(reason.into());
        self
    }

    /// Makes submissions fail at the transport level.
    pub fn with_unreachable_submission(mut self, message: impl Into<String>) -> Self {
        self.submit = SubmitBehavior::Unreachable(message.into());
        self
    }

    /// Sets the execution details returned for the scan.
    pub fn with_execution_details(mut self, details: ScanExecutionDetails) -> Self {
        self.execution_details = details;
        self
    }

    /// Appends a poll that reports `status`.
    pub fn then_status(self, status: ScanStatus) -> Self {
        self.then_status_times(status, 1)
    }

    /// Appends `times` polls that report `status`.
    pub fn then_status_times(self, status: ScanStatus, times: usize) -> Self {
        lock(&self.script).extend(std::iter::repeat(Some(status)).take(times));
        self
    }

    /// Appends a poll that fails.
    pub fn then_fail(self) -> Self {
        self.then_fail_times(1)
    }

    /// Appends `times` polls that fail.
    pub fn then_fail_times(self, times: usize) -> Self {
        lock(&self.script).extend(std::iter::repeat(None).take(times));
        self
    }

    /// Returns the number of submissions received.
    pub fn submit_count(&self) -> u64 {
        self.submit_count.load(Ordering::Relaxed)
    }

    /// Returns the number of status polls received.
    pub fn poll_count(&self) -> u64 {
        self.poll_count.load(Ordering::Relaxed)
    }

    fn next_entry(&self) -> Option<Option<ScanStatus>> {
        let mut last = lock(&self.last);
        if let Some(entry) = lock(&self.script).pop_front() {
            *last = Some(entry);
        }
        last.clone()
    }
}

impl Default for MockScanApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScanApi for MockScanApi {
    async fn submit_scan(&self, scan_config_id: &str) -> Result<ScanId, ScanError> {
        self.submit_count.fetch_add(1, Ordering::Relaxed);

        match &self.submit {
            SubmitBehavior::Accept => Ok(self.scan_id.clone()),
            SubmitBehavior::Reject(reason) => Err(ScanError::submission_failed(format!(
                "scan config {}: {}",
                scan_config_id, reason
            ))),
            SubmitBehavior::Unreachable(message) => {
                Err(ScanError::connection_failed("scan", message.clone()))
            }
        }
    }

    async fn get_scan(&self, scan_id: &ScanId) -> Result<Scan, ScanError> {
        self.poll_count.fetch_add(1, Ordering::Relaxed);

        match self.next_entry() {
            Some(Some(status)) => Ok(Scan::new(scan_id.clone(), status)),
            Some(None) => Err(ScanError::connection_failed("scan", "simulated failure")),
            None => Err(ScanError::ambiguous_response("scan", "no scripted status")),
        }
    }

    async fn get_execution_details(
        &self,
        _scan_id: &ScanId,
    ) -> Result<ScanExecutionDetails, ScanError> {
        Ok(self.execution_details.clone())
    }
}

/// A search service over a fixed set of findings.
#[derive(Debug)]
pub struct MockSearchApi {
    vulnerabilities: Vec<Vulnerability>,
    page_size: usize,
    queries: Mutex<Vec<String>>,
    page_requests: AtomicU64,
}

impl MockSearchApi {
    /// Creates a search service with no findings.
    pub fn new() -> Self {
        Self {
            vulnerabilities: Vec::new(),
            page_size: 50,
            queries: Mutex::new(Vec::new()),
            page_requests: AtomicU64::new(0),
        }
    }

    /// Sets the findings every search returns.
    pub fn with_vulnerabilities(
        mut self,
        vulnerabilities: impl IntoIterator<Item = Vulnerability>,
    ) -> Self {
        self.vulnerabilities = vulnerabilities.into_iter().collect();
        self
    }

    /// Sets the page size.
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = size.max(1);
        self
    }

    /// Returns the query of every search started, in order.
    pub fn queries(&self) -> Vec<String> {
        lock(&self.queries).clone()
    }

    /// Returns the number of pages requested.
    pub fn page_requests(&self) -> u64 {
        self.page_requests.load(Ordering::Relaxed)
    }
}

impl Default for MockSearchApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchApi for MockSearchApi {
    async fn search_page(
        &self,
        request: &SearchRequest,
        index: u32,
    ) -> Result<SearchPage<Vulnerability>, ScanError> {
        self.page_requests.fetch_add(1, Ordering::Relaxed);
        if index == 0 {
            lock(&self.queries).push(request.query.clone());
        }

        let total_pages = self.vulnerabilities.len().div_ceil(self.page_size).max(1);
        let data = self
            .vulnerabilities
            .iter()
            .skip(index as usize * self.page_size)
            .take(self.page_size)
            .cloned()
            .collect();

        Ok(SearchPage::new(data, index, total_pages as u32))
    }
}

/// An event sink that keeps every event.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<LifecycleEvent>>,
}

impl RecordingEventSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded events.
    pub fn events(&self) -> Vec<LifecycleEvent> {
        lock(&self.events).clone()
    }

    /// Returns the recorded events as progress lines.
    pub fn lines(&self) -> Vec<String> {
        lock(&self.events).iter().map(ToString::to_string).collect()
    }

    /// Returns how many recorded events have the given type.
    pub fn count(&self, event_type: &str) -> usize {
        lock(&self.events)
            .iter()
            .filter(|e| e.event_type() == event_type)
            .count()
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: &LifecycleEvent) {
        lock(&self.events).push(event.clone());
    }
}

/// A sleeper that records every wait before delegating to the tokio timer.
///
/// Combined with a paused tokio clock, waits complete instantly while
/// still advancing time.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    /// Creates a sleeper with no recorded waits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded waits.
    pub fn sleeps(&self) -> Vec<Duration> {
        lock(&self.sleeps).clone()
    }
}

#[async_trait]
impl PollSleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration, cancel: &CancellationToken) -> Result<(), ScanError> {
        lock(&self.sleeps).push(duration);
        TokioSleeper.sleep(duration, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_script_repeats_last_entry() {
        let api = MockScanApi::new()
            .then_fail()
            .then_status(ScanStatus::Running);
        let id = ScanId::new("s");

        assert!(api.get_scan(&id).await.is_err());
        assert_eq!(api.get_scan(&id).await.unwrap().status, ScanStatus::Running);
        assert_eq!(api.get_scan(&id).await.unwrap().status, ScanStatus::Running);
        assert_eq!(api.poll_count(), 3);
    }

    #[tokio::test]
    async fn test_submission_behaviors() {
        let api = MockScanApi::new().with_scan_id(ScanId::new("abc"));
        assert_eq!(api.submit_scan("cfg").await.unwrap().as_str(), "abc");

        let api = MockScanApi::new().with_rejected_submission("400 Bad Request");
        assert!(matches!(
            api.submit_scan("cfg").await,
            Err(ScanError::SubmissionFailed { .. })
        ));
        assert_eq!(api.submit_count(), 1);
    }

    #[tokio::test]
    async fn test_search_pages() {
        let search = MockSearchApi::new()
            .with_page_size(2)
            .with_vulnerabilities((0..3).map(|i| Vulnerability::new(i.to_string())));
        let request = SearchRequest::vulnerabilities("q");

        let first = search.search_page(&request, 0).await.unwrap();
        assert_eq!(first.data.len(), 2);
        assert_eq!(first.metadata.total_pages, Some(2));

        let second = search.search_page(&request, 1).await.unwrap();
        assert_eq!(second.data.len(), 1);
        assert_eq!(search.queries(), vec!["q".to_string()]);
    }
}
