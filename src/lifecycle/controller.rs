//! The scan lifecycle controller.

use crate::config::ScanRequest;
use crate::core::{ArcScanApi, ArcSearchApi, ScanError, ScanId, ScanResults, ScanStatus};
use crate::events::{EventSink, LifecycleEvent, TracingEventSink};
use crate::lifecycle::duration::DurationGuard;
use crate::lifecycle::poller::{PollOutcome, StatusPoller};
use crate::lifecycle::sleeper::{PollSleeper, TokioSleeper};
use crate::lifecycle::state::{LifecyclePhase, StatusVerdict};
use crate::results::ResultAggregator;

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Fixed wait between two status polls.
pub const POLL_INTERVAL: Duration = Duration::from_secs(15);

/// Builder for creating a `ScanLifecycleController`.
pub struct ScanLifecycleControllerBuilder {
    scan_api: Option<ArcScanApi>,
    search_api: Option<ArcSearchApi>,
    sleeper: Arc<dyn PollSleeper>,
    events: Arc<dyn EventSink>,
}

impl ScanLifecycleControllerBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            scan_api: None,
            search_api: None,
            sleeper: Arc::new(TokioSleeper),
            events: Arc::new(TracingEventSink),
        }
    }

    /// Sets the scan service.
    pub fn scan_api<S: crate::core::ScanApi + 'static>(mut self, api: S) -> Self {
        self.scan_api = Some(Arc::new(api));
        self
    }

    /// Sets a shared scan service.
    pub fn arc_scan_api(mut self, api: ArcScanApi) -> Self {
        self.scan_api = Some(api);
        self
    }

    /// Sets the search service.
    pub fn search_api<S: crate::core::SearchApi + 'static>(mut self, api: S) -> Self {
        self.search_api = Some(Arc::new(api));
        self
    }

    /// Sets a shared search service.
    pub fn arc_search_api(mut self, api: ArcSearchApi) -> Self {
        self.search_api = Some(api);
        self
    }

    /// Replaces the sleeper used between polls.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn PollSleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Replaces the progress event sink.
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Builds the controller.
    pub fn build(self) -> Result<ScanLifecycleController, ScanError> {
        let scan_api = self
            .scan_api
            .ok_or_else(|| ScanError::configuration("a scan API is required"))?;
        let search_api = self
            .search_api
            .ok_or_else(|| ScanError::configuration("a search API is required"))?;

        Ok(ScanLifecycleController {
            scan_api,
            search_api,
            sleeper: self.sleeper,
            events: self.events,
        })
    }
}

impl Default for ScanLifecycleControllerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Drives one scan from submission to the requested advance level.
///
/// A controller holds no per-run state; it may serve any number of
/// concurrent runs as long as its collaborators can.
pub struct ScanLifecycleController {
    scan_api: ArcScanApi,
    search_api: ArcSearchApi,
    sleeper: Arc<dyn PollSleeper>,
    events: Arc<dyn EventSink>,
}

impl ScanLifecycleController {
    /// Creates a new builder.
    pub fn builder() -> ScanLifecycleControllerBuilder {
        ScanLifecycleControllerBuilder::new()
    }

    /// Submits a scan and advances it as far as `request` asks.
    ///
    /// Returns results only for the completed levels. `cancel` is honored
    /// while waiting between polls; the remote scan keeps running.
    ///
    /// # Errors
    ///
    /// - `SubmissionFailed` - The scan could not be submitted.
    /// - `ScanFailed` - The scan reached `FAILED` or `CANCELING`.
    /// - `PollingAborted` - More than 20 consecutive polls failed.
    /// - `TimedOut` - A duration ceiling was breached.
    /// - `Cancelled` - `cancel` fired during a wait.
    pub async fn run(
        &self,
        request: &ScanRequest,
        cancel: &CancellationToken,
    ) -> Result<Option<ScanResults>, ScanError> {
        request.validate()?;

        let result = self.drive(request, cancel).await;
        if let Err(e) = &result {
            self.events.emit(&LifecycleEvent::aborted(e));
        }
        result
    }

    async fn drive(
        &self,
        request: &ScanRequest,
        cancel: &CancellationToken,
    ) -> Result<Option<ScanResults>, ScanError> {
        let policy = request.advance_level.policy();
        let mut phase = LifecyclePhase::Submitting;

        loop {
            tracing::trace!(phase = phase.name(), "Entering phase");

            phase = match phase {
                LifecyclePhase::Submitting => {
                    let submitted_at = Instant::now();
                    let scan_id = self.submit(&request.scan_config_id).await?;

                    self.events.emit(&LifecycleEvent::AdvanceLevelSelected {
                        level: request.advance_level,
                    });

                    match policy.target.clone() {
                        Some(target) => LifecyclePhase::Polling {
                            scan_id,
                            target,
                            submitted_at,
                        },
                        None => LifecyclePhase::Finished(None),
                    }
                }
                LifecyclePhase::Polling {
                    scan_id,
                    target,
                    submitted_at,
                } => {
                    let mut guard = DurationGuard::new(submitted_at, request.budget());
                    self.poll_until(&scan_id, &target, &mut guard, cancel)
                        .await?;

                    if policy.collect_results {
                        let query = if policy.apply_query {
                            request.vulnerability_query.clone()
                        } else {
                            None
                        };
                        LifecyclePhase::Aggregating { scan_id, query }
                    } else {
                        LifecyclePhase::Finished(None)
                    }
                }
                LifecyclePhase::Aggregating { scan_id, query } => {
                    let aggregator = ResultAggregator::new(
                        self.scan_api.as_ref(),
                        self.search_api.as_ref(),
                        self.events.as_ref(),
                    );
                    let results = aggregator.aggregate(&scan_id, query.as_deref()).await?;
                    LifecyclePhase::Finished(Some(results))
                }
                LifecyclePhase::Finished(results) => return Ok(results),
            };
        }
    }

    async fn submit(&self, scan_config_id: &str) -> Result<ScanId, ScanError> {
        self.events.emit(&LifecycleEvent::SubmittingScan {
            scan_config_id: scan_config_id.to_string(),
        });

        let scan_id = self
            .scan_api
            .submit_scan(scan_config_id)
            .await
            .map_err(|e| match e {
                ScanError::SubmissionFailed { .. } => e,
                other => ScanError::submission_failed(other.to_string()),
            })?;

        self.events.emit(&LifecycleEvent::ScanSubmitted {
            scan_id: scan_id.clone(),
        });
        self.events.emit(&LifecycleEvent::ScanIdAssigned {
            scan_id: scan_id.clone(),
        });

        Ok(scan_id)
    }

    /// Polls until `target` is observed, a failure status is observed, or
    /// a fatal error is raised.
    async fn poll_until(
        &self,
        scan_id: &ScanId,
        target: &ScanStatus,
        guard: &mut DurationGuard,
        cancel: &CancellationToken,
    ) -> Result<(), ScanError> {
        self.events.emit(&LifecycleEvent::PollingStarted {
            scan_id: scan_id.clone(),
        });

        let mut poller = StatusPoller::new(self.scan_api.as_ref(), scan_id);
        let mut last_status: Option<ScanStatus> = None;

        // The first poll happens right away; ceilings are only enforced
        // after each wait.
        let mut outcome = poller.poll().await?;

        loop {
            if let PollOutcome::Observed(scan) = &outcome {
                let status = &scan.status;
                self.track_status(&mut last_status, status);

                let verdict = StatusVerdict::evaluate(status, target);
                tracing::trace!(
                    scan_id = %scan_id,
                    attempt = poller.attempts(),
                    status = %status,
                    verdict = verdict.name(),
                    "Status evaluated"
                );

                match verdict {
                    StatusVerdict::Failed(status) => {
                        self.events
                            .emit(&LifecycleEvent::ScanFailing { status: status.clone() });
                        return Err(ScanError::ScanFailed { status });
                    }
                    StatusVerdict::Reached => {
                        self.events.emit(&LifecycleEvent::TargetReached {
                            status: status.clone(),
                        });
                        return Ok(());
                    }
                    StatusVerdict::Continue => guard.observe(status),
                }
            }

            self.sleeper.sleep(POLL_INTERVAL, cancel).await?;

            if let Some(status) = &last_status {
                guard.check(status)?;
            }

            outcome = poller.poll().await?;
        }
    }

    fn track_status(&self, last_status: &mut Option<ScanStatus>, status: &ScanStatus) {
        match last_status.as_ref() {
            None => {
                self.events.emit(&LifecycleEvent::StatusObserved {
                    status: status.clone(),
                });
            }
            Some(previous) if previous != status => {
                self.events.emit(&LifecycleEvent::StatusChanged {
                    from: previous.clone(),
                    to: status.clone(),
                });
            }
            Some(_) => return,
        }
        *last_status = Some(status.clone());
    }
}

impl std::fmt::Debug for ScanLifecycleController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanLifecycleController")
            .field("scan_api", &self.scan_api)
            .field("search_api", &self.search_api)
            .field("sleeper", &self.sleeper)
            .finish()
    }
}
