//! Submit scans without waiting for them, or wait only until they start.
//!
//! Run with: cargo run --example fire_and_forget

use scanpilot::backends::{MockScanApi, MockSearchApi};
use scanpilot::prelude::*;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    tokio::time::pause();

    println!("=== Scanpilot: Fire And Forget ===\n");

    let controller = ScanLifecycleController::builder()
        .scan_api(MockScanApi::new().then_status(ScanStatus::Running))
        .search_api(MockSearchApi::new())
        .build()?;

    let request = ScanRequest::new("5f3c8a2e-config", AdvanceLevel::Submitted);
    let results = controller.run(&request, &CancellationToken::new()).await?;
    println!("Submitted, results collected: {}", results.is_some());

    // A scan that never leaves the queue trips its pending ceiling.
    println!("\n=== Waiting For A Start That Never Comes ===\n");

    let controller = ScanLifecycleController::builder()
        .scan_api(MockScanApi::new().then_status(ScanStatus::Queued))
        .search_api(MockSearchApi::new())
        .build()?;

    let request = ScanRequest::new("5f3c8a2e-config", AdvanceLevel::Started)
        .with_max_pending_duration(Duration::from_secs(60));

    match controller.run(&request, &CancellationToken::new()).await {
        Ok(_) => println!("Scan started"),
        Err(e @ ScanError::TimedOut { .. }) => println!("Gave up: {}", e),
        Err(e) => return Err(e.into()),
    }

    // Cancelling stops the wait; the remote scan keeps running.
    println!("\n=== Cancelling A Run ===\n");

    let controller = ScanLifecycleController::builder()
        .scan_api(MockScanApi::new().then_status(ScanStatus::Running))
        .search_api(MockSearchApi::new())
        .build()?;

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(100)).await;
        canceller.cancel();
    });

    let request = ScanRequest::new("5f3c8a2e-config", AdvanceLevel::Completed);
    match controller.run(&request, &token).await {
        Err(ScanError::Cancelled) => println!("Run cancelled"),
        other => println!("Unexpected outcome: {:?}", other.map(|r| r.is_some())),
    }

    println!("\n=== Example Complete ===");
    Ok(())
}
