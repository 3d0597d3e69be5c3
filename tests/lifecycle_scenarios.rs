//! End-to-end runs of the lifecycle controller against scripted services.

use scanpilot::backends::{MockScanApi, MockSearchApi, RecordingEventSink, RecordingSleeper};
use scanpilot::lifecycle::{FAILURE_THRESHOLD, POLL_INTERVAL};
use scanpilot::prelude::*;

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

struct Harness {
    scan: Arc<MockScanApi>,
    search: Arc<MockSearchApi>,
    events: Arc<RecordingEventSink>,
    sleeper: Arc<RecordingSleeper>,
    controller: ScanLifecycleController,
}

impl Harness {
    fn new(scan: MockScanApi) -> Self {
        Self::with_search(scan, MockSearchApi::new())
    }

    fn with_search(scan: MockScanApi, search: MockSearchApi) -> Self {
        let scan = Arc::new(scan.with_scan_id(ScanId::new("scan-42")));
        let search = Arc::new(search);
        let events = Arc::new(RecordingEventSink::new());
        let sleeper = Arc::new(RecordingSleeper::new());

        let controller = ScanLifecycleController::builder()
            .arc_scan_api(scan.clone())
            .arc_search_api(search.clone())
            .with_event_sink(events.clone())
            .with_sleeper(sleeper.clone())
            .build()
            .unwrap();

        Self {
            scan,
            search,
            events,
            sleeper,
            controller,
        }
    }

    async fn run(&self, request: &ScanRequest) -> Result<Option<ScanResults>, ScanError> {
        self.controller.run(request, &CancellationToken::new()).await
    }
}

#[tokio::test(start_paused = true)]
async fn submitted_level_returns_without_polling() {
    let harness = Harness::new(MockScanApi::new().then_status(ScanStatus::Running));

    let result = harness
        .run(&ScanRequest::new("cfg-1", AdvanceLevel::Submitted))
        .await
        .unwrap();

    assert!(result.is_none());
    assert_eq!(harness.scan.submit_count(), 1);
    assert_eq!(harness.scan.poll_count(), 0);
    assert!(harness.sleeper.sleeps().is_empty());
}

#[tokio::test(start_paused = true)]
async fn rejected_submission_is_fatal() {
    let harness = Harness::new(MockScanApi::new().with_rejected_submission("400 Bad Request"));

    let err = harness
        .run(&ScanRequest::new("cfg-1", AdvanceLevel::Completed))
        .await
        .unwrap_err();

    assert!(matches!(err, ScanError::SubmissionFailed { .. }));
    assert_eq!(harness.scan.submit_count(), 1);
    assert_eq!(harness.scan.poll_count(), 0);
    assert_eq!(harness.events.count("run_aborted"), 1);
}

#[tokio::test(start_paused = true)]
async fn unreachable_submission_is_reported_as_submission_failure() {
    let harness = Harness::new(MockScanApi::new().with_unreachable_submission("dns error"));

    let err = harness
        .run(&ScanRequest::new("cfg-1", AdvanceLevel::Started))
        .await
        .unwrap_err();

    assert!(matches!(err, ScanError::SubmissionFailed { .. }));
    assert!(err.to_string().contains("dns error"));
}

#[tokio::test(start_paused = true)]
async fn completes_with_filtered_results() {
    let scan = MockScanApi::new()
        .then_status(ScanStatus::Pending)
        .then_status(ScanStatus::Running)
        .then_status(ScanStatus::Complete);
    let search = MockSearchApi::new()
        .with_page_size(2)
        .with_vulnerabilities(vec![
            Vulnerability::new("v-1").with_severity("HIGH"),
            Vulnerability::new("v-2").with_severity("HIGH"),
            Vulnerability::new("v-3").with_severity("HIGH"),
        ]);
    let harness = Harness::with_search(scan, search);

    let request = ScanRequest::new("cfg-1", AdvanceLevel::CompletedWithResults)
        .with_vulnerability_query("vulnerability.severity='HIGH'");
    let results = harness.run(&request).await.unwrap().unwrap();

    assert_eq!(harness.sleeper.sleeps(), vec![POLL_INTERVAL, POLL_INTERVAL]);
    assert_eq!(results.scan_id, ScanId::new("scan-42"));
    assert_eq!(results.vulnerability_count(), 3);
    assert_eq!(
        harness.search.queries(),
        vec!["vulnerability.scans.id='scan-42' && vulnerability.severity='HIGH'".to_string()]
    );

    let lines = harness.events.lines();
    assert!(lines.contains(&"Scan submitted successfully".to_string()));
    assert!(lines.contains(&"Scan id: scan-42".to_string()));
    assert!(lines.contains(&"Scan status: PENDING".to_string()));
    assert!(lines.contains(&"Scan status has been updated from PENDING to RUNNING".to_string()));
    assert!(lines.contains(&"Scan status has been updated from RUNNING to COMPLETE".to_string()));
    assert!(lines.contains(&"Desired scan status has been reached".to_string()));
}

#[tokio::test(start_paused = true)]
async fn completed_level_ignores_the_filter() {
    let harness = Harness::new(MockScanApi::new().then_status(ScanStatus::Complete));

    let request = ScanRequest::new("cfg-1", AdvanceLevel::Completed)
        .with_vulnerability_query("vulnerability.severity='HIGH'");
    let results = harness.run(&request).await.unwrap();

    assert!(results.is_some());
    assert!(harness.sleeper.sleeps().is_empty());
    assert_eq!(
        harness.search.queries(),
        vec!["vulnerability.scans.id='scan-42'".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn failed_initial_poll_is_recovered() {
    let scan = MockScanApi::new()
        .then_fail()
        .then_status(ScanStatus::Running)
        .then_status(ScanStatus::Complete);
    let harness = Harness::new(scan);

    let result = harness
        .run(&ScanRequest::new("cfg-1", AdvanceLevel::Completed))
        .await;

    assert!(result.unwrap().is_some());
    assert_eq!(harness.sleeper.sleeps().len(), 2);
    assert_eq!(
        harness.events.events().into_iter().filter(|e| matches!(
            e,
            LifecycleEvent::StatusObserved { .. } | LifecycleEvent::StatusChanged { .. }
        )).collect::<Vec<_>>(),
        vec![
            LifecycleEvent::StatusObserved {
                status: ScanStatus::Running
            },
            LifecycleEvent::StatusChanged {
                from: ScanStatus::Running,
                to: ScanStatus::Complete
            },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn status_changes_are_logged_only_on_change() {
    let scan = MockScanApi::new()
        .then_status_times(ScanStatus::Pending, 3)
        .then_status_times(ScanStatus::Running, 4)
        .then_status(ScanStatus::Complete);
    let harness = Harness::new(scan);

    harness
        .run(&ScanRequest::new("cfg-1", AdvanceLevel::Completed))
        .await
        .unwrap();

    assert_eq!(harness.events.count("status_observed"), 1);
    assert_eq!(harness.events.count("status_changed"), 2);
    assert_eq!(harness.sleeper.sleeps().len(), 7);
}

#[tokio::test(start_paused = true)]
async fn failure_status_takes_precedence_and_stops_polling() {
    let scan = MockScanApi::new()
        .then_status(ScanStatus::Pending)
        .then_status(ScanStatus::Failed)
        .then_status(ScanStatus::Complete);
    let harness = Harness::new(scan);

    let err = harness
        .run(&ScanRequest::new("cfg-1", AdvanceLevel::Started))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ScanError::ScanFailed {
            status: ScanStatus::Failed
        }
    ));
    assert_eq!(err.to_string(), "scan has failed. status: FAILED");
    assert_eq!(harness.scan.poll_count(), 2);
    assert!(harness
        .events
        .lines()
        .contains(&"Failing scan due to status: FAILED".to_string()));
}

#[tokio::test(start_paused = true)]
async fn canceling_on_first_poll_fails_immediately() {
    let harness = Harness::new(MockScanApi::new().then_status(ScanStatus::Canceling));

    let err = harness
        .run(&ScanRequest::new("cfg-1", AdvanceLevel::Completed))
        .await
        .unwrap_err();

    assert_eq!(err.failed_status(), Some(&ScanStatus::Canceling));
    assert_eq!(harness.scan.poll_count(), 1);
    assert!(harness.sleeper.sleeps().is_empty());
}

#[tokio::test(start_paused = true)]
async fn failure_budget_resets_after_a_success() {
    let scan = MockScanApi::new()
        .then_fail_times(FAILURE_THRESHOLD as usize)
        .then_status(ScanStatus::Running)
        .then_fail_times(FAILURE_THRESHOLD as usize)
        .then_status(ScanStatus::Complete);
    let harness = Harness::new(scan);

    let result = harness
        .run(&ScanRequest::new("cfg-1", AdvanceLevel::Completed))
        .await;

    assert!(result.unwrap().is_some());
    assert_eq!(harness.scan.poll_count(), 42);
    assert_eq!(harness.sleeper.sleeps().len(), 41);
}

#[tokio::test(start_paused = true)]
async fn twenty_first_consecutive_failure_aborts_polling() {
    let harness = Harness::new(MockScanApi::new().then_fail_times(30));

    let err = harness
        .run(&ScanRequest::new("cfg-1", AdvanceLevel::Completed))
        .await
        .unwrap_err();

    match &err {
        ScanError::PollingAborted { failures, .. } => assert_eq!(*failures, 21),
        other => panic!("expected polling abort, got {:?}", other),
    }
    assert_eq!(err.to_string(), "scan polling has failed 21 times, aborting");
    assert_eq!(harness.scan.poll_count(), 21);
    assert_eq!(harness.sleeper.sleeps().len(), 20);
}

#[tokio::test(start_paused = true)]
async fn execution_ceiling_trips_before_completion() {
    let scan = MockScanApi::new()
        .then_status_times(ScanStatus::Running, 5)
        .then_status(ScanStatus::Complete);
    let harness = Harness::new(scan);

    let request = ScanRequest::new("cfg-1", AdvanceLevel::Completed)
        .with_max_execution_duration(Duration::from_secs(60));
    let err = harness.run(&request).await.unwrap_err();

    match err {
        ScanError::TimedOut { phase, elapsed, limit } => {
            assert_eq!(phase, DurationPhase::Executing);
            assert_eq!(limit, Duration::from_secs(60));
            assert!(elapsed >= Duration::from_secs(75));
            assert!(elapsed < Duration::from_secs(76));
        }
        other => panic!("expected timeout, got {:?}", other),
    }
    assert_eq!(harness.scan.poll_count(), 5);
    assert_eq!(harness.sleeper.sleeps().len(), 5);
    assert_eq!(harness.events.count("target_reached"), 0);
}

#[tokio::test(start_paused = true)]
async fn execution_ceiling_applies_while_polls_fail() {
    let scan = MockScanApi::new()
        .then_status(ScanStatus::Running)
        .then_fail_times(10);
    let harness = Harness::new(scan);

    let request = ScanRequest::new("cfg-1", AdvanceLevel::Completed)
        .with_max_execution_duration(Duration::from_secs(30));
    let err = harness.run(&request).await.unwrap_err();

    assert!(matches!(
        err,
        ScanError::TimedOut {
            phase: DurationPhase::Executing,
            ..
        }
    ));
    assert_eq!(harness.scan.poll_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn execution_clock_ignores_time_spent_pending() {
    let scan = MockScanApi::new()
        .then_status_times(ScanStatus::Pending, 8)
        .then_status_times(ScanStatus::Running, 3)
        .then_status(ScanStatus::Complete);
    let harness = Harness::new(scan);

    let request = ScanRequest::new("cfg-1", AdvanceLevel::Completed)
        .with_max_execution_duration(Duration::from_secs(60));
    let result = harness.run(&request).await;

    assert!(result.unwrap().is_some());
}

#[tokio::test(start_paused = true)]
async fn pending_ceiling_trips_while_queued() {
    let harness = Harness::new(MockScanApi::new().then_status_times(ScanStatus::Pending, 10));

    let request = ScanRequest::new("cfg-1", AdvanceLevel::Started)
        .with_max_pending_duration(Duration::from_secs(30));
    let err = harness.run(&request).await.unwrap_err();

    assert!(matches!(
        err,
        ScanError::TimedOut {
            phase: DurationPhase::Pending,
            ..
        }
    ));
    assert_eq!(harness.scan.poll_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn cancellation_aborts_at_the_next_wait() {
    let harness = Harness::new(MockScanApi::new().then_status_times(ScanStatus::Pending, 100));
    let token = CancellationToken::new();

    let canceller = {
        let token = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(40)).await;
            token.cancel();
        })
    };

    let request = ScanRequest::new("cfg-1", AdvanceLevel::Completed);
    let err = harness.controller.run(&request, &token).await.unwrap_err();
    canceller.await.unwrap();

    assert!(matches!(err, ScanError::Cancelled));
    assert_eq!(harness.scan.poll_count(), 3);
}
