//! End-to-end flow from tool execution through classification,
//! rendering and report persistence.

use std::time::Duration;

use sigbridge::delivery::persist_report;
use sigbridge::exec::{Command, ProcessSupervisor};
use sigbridge::report::{ReportClassifier, ReportFormat, ReportRenderer, VerificationStatus};

#[cfg(unix)]
#[tokio::test]
async fn test_signed_tool_output_becomes_signed_ok_report() {
    let supervisor = ProcessSupervisor::new(Duration::from_secs(5));
    // Stand-in for the verification tool: prints a signed verdict.
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("verify.sh");
    std::fs::write(&script, "#!/bin/sh\necho jar verified.\n").unwrap();
    let command = Command::parse(&format!("sh {}", script.display())).unwrap();

    let result = supervisor.execute(&command).await;
    assert!(result.succeeded);

    let text = result.report_text("Signature Verifier");
    let status = ReportClassifier::new().classify(&text);
    assert_eq!(status, VerificationStatus::SignedOk);

    let report = ReportRenderer::new("Signature Verifier")
        .render(ReportFormat::Html, "demo.apk", status, &text)
        .unwrap();
    assert!(report.body.contains("SIGNED_OK"));
    assert!(report.body.contains("jar verified."));
}

#[cfg(unix)]
#[tokio::test]
async fn test_failed_tool_run_becomes_error_report() {
    let supervisor = ProcessSupervisor::new(Duration::from_secs(5));
    let command = Command::parse("ls /sigbridge-missing-artifact").unwrap();

    let result = supervisor.execute(&command).await;
    assert!(!result.succeeded);

    // Failed runs skip classification and report ERROR directly.
    let text = result.report_text("Signature Verifier");
    let report = ReportRenderer::new("Signature Verifier")
        .render(ReportFormat::Html, "demo.apk", VerificationStatus::Error, &text)
        .unwrap();
    assert!(report.body.contains("ERROR"));
}

#[tokio::test]
async fn test_persisted_report_round_trips_byte_identical() {
    let renderer = ReportRenderer::new("Signature Verifier");
    let report = renderer
        .render(
            ReportFormat::Html,
            "demo.apk",
            VerificationStatus::Warning,
            "jar verified.\nWarning: certificate self-signed",
        )
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let report_path = dir.path().join("app-7").join("report.html");
    persist_report(&report_path, &report.body).await.unwrap();

    let read_back = tokio::fs::read_to_string(&report_path).await.unwrap();
    assert_eq!(read_back, report.body);
}
