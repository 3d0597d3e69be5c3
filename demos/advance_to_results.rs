//! Advance a scan all the way to filtered vulnerability results.
//!
//! This example shows how to:
//! - Build a ScanLifecycleController
//! - Load a ScanRequest from JSON
//! - Collect the findings of a completed scan
//!
//! Run with: cargo run --example advance_to_results

use scanpilot::backends::{MockScanApi, MockSearchApi};
use scanpilot::core::ScanExecutionDetails;
use scanpilot::prelude::*;
use tokio_util::sync::CancellationToken;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    // Mock scans answer instantly; skip the real 15 second waits.
    tokio::time::pause();

    println!("=== Scanpilot: Advance To Results ===\n");

    let scan_api = MockScanApi::new()
        .with_scan_id(ScanId::new("7a8f0a3c-demo"))
        .then_status_times(ScanStatus::Queued, 2)
        .then_fail()
        .then_status_times(ScanStatus::Running, 3)
        .then_status(ScanStatus::Complete)
        .with_execution_details(ScanExecutionDetails {
            links_crawled: Some(412),
            attacked: Some(1_890),
            requests: Some(25_034),
            ..Default::default()
        });

    let search_api = MockSearchApi::new().with_vulnerabilities(vec![
        Vulnerability::new("vuln-1").with_severity("HIGH"),
        Vulnerability::new("vuln-2").with_severity("HIGH"),
    ]);

    let controller = ScanLifecycleController::builder()
        .scan_api(scan_api)
        .search_api(search_api)
        .build()?;

    let request = ScanRequest::from_json(
        r#"{
            "scan_config_id": "5f3c8a2e-config",
            "advance_level": "VULNERABILITY_RESULTS",
            "vulnerability_query": "vulnerability.severity='HIGH'",
            "max_scan_execution_duration": "2h"
        }"#,
    )?;

    println!("Advance level: {}", request.advance_level.display_name());

    let results = controller.run(&request, &CancellationToken::new()).await?;

    match results {
        Some(results) => {
            println!("\n=== Scan Results ===");
            println!("Scan ID: {}", results.scan_id);
            println!("Vulnerabilities: {}", results.vulnerability_count());
            for vulnerability in &results.vulnerabilities {
                println!(
                    "  - {} (severity: {})",
                    vulnerability.id,
                    vulnerability.severity.as_deref().unwrap_or("unknown")
                );
            }
            println!(
                "Links crawled: {}",
                results.execution_details.links_crawled.unwrap_or(0)
            );
        }
        None => println!("\nNo results collected"),
    }

    println!("\n=== Example Complete ===");
    Ok(())
}
