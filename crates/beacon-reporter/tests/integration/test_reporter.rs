//! Delivery path: enrichment, opt-out and swallowed failures

use std::sync::Arc;
use std::time::Duration;

use beacon_core::{OptOutFlag, ReporterConfig, TelemetryEvent, TelemetryEventKind};
use beacon_reporter::Reporter;
use serial_test::serial;

use crate::common::{
    mock_collector, received_events, reporter_for, reporter_with, wait_until, GatedClient,
};

#[tokio::test]
async fn test_event_reaches_collector() {
    let server = mock_collector(200).await;
    let reporter = reporter_for(&server, ReporterConfig::default().with_tags(["test-tag"]));

    reporter.report_event(TelemetryEvent::new("TestEvent").with_value("key1", "value1"));

    let collector = &server;
    let arrived = wait_until(Duration::from_secs(1), move || async move {
        !received_events(collector).await.is_empty()
    })
    .await;
    assert!(arrived, "collector received no event within 1s");

    let events = received_events(&server).await;
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.name, "TestEvent");
    assert_eq!(event.values["key1"], "value1");
    assert_eq!(event.tags[0], "test-tag");
    assert!(!event.session_id.is_empty());
    assert!(event.timestamp.is_some());

    reporter.shutdown(Duration::from_secs(1)).await.unwrap();
}

#[tokio::test]
#[serial]
async fn test_do_not_track_suppresses_delivery() {
    const VAR: &str = "BEACON_TEST_REPORTER_DO_NOT_TRACK";
    std::env::set_var(VAR, "1");

    let server = mock_collector(200).await;
    let config = ReporterConfig {
        base_url: server.uri(),
        opt_out_env: VAR.to_string(),
        ..ReporterConfig::default()
    }
    .with_tags(["test-tag"]);
    let reporter = Reporter::builder(config).build().unwrap();

    reporter.report_event(TelemetryEvent::new("TestEvent").with_value("key1", "value1"));
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(received_events(&server).await.is_empty());
    assert_eq!(reporter.metrics().snapshot().opted_out, 1);
    reporter.shutdown(Duration::from_secs(1)).await.unwrap();

    std::env::remove_var(VAR);
}

#[tokio::test]
async fn test_opt_out_is_checked_per_event() {
    let client = GatedClient::new();
    client.open();
    let flag = OptOutFlag::new(true);
    let reporter = Reporter::builder(ReporterConfig::new("http://localhost:1"))
        .delivery_client(client.clone())
        .opt_out(Arc::new(flag.clone()))
        .build()
        .unwrap();

    reporter.report_event(TelemetryEvent::new("Suppressed"));
    flag.set(false);
    reporter.report_event(TelemetryEvent::new("Delivered"));
    flag.set(true);
    reporter.report_event(TelemetryEvent::new("SuppressedAgain"));

    reporter.shutdown(Duration::from_secs(1)).await.unwrap();

    let names: Vec<_> = client.delivered().into_iter().map(|e| e.name).collect();
    assert_eq!(names, vec!["Delivered"]);
    let snapshot = reporter.metrics().snapshot();
    assert_eq!(snapshot.opted_out, 2);
    assert_eq!(snapshot.admitted, 1);
}

#[tokio::test]
async fn test_configured_tags_follow_caller_tags() {
    let client = GatedClient::new();
    client.open();
    let reporter = reporter_with(
        ReporterConfig::new("http://localhost:1").with_tags(["linux", "beta"]),
        client.clone(),
    );

    reporter.report_event(
        TelemetryEvent::new("Tagged")
            .with_kind(TelemetryEventKind::Warning)
            .with_tag("mine"),
    );
    reporter.shutdown(Duration::from_secs(1)).await.unwrap();

    let delivered = client.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].tags, vec!["mine", "linux", "beta"]);
    assert_eq!(delivered[0].session_id, reporter.session_id().as_str());
    assert_eq!(delivered[0].kind, Some(TelemetryEventKind::Warning));
}

#[tokio::test]
async fn test_caller_session_id_is_kept() {
    let client = GatedClient::new();
    client.open();
    let reporter = reporter_with(ReporterConfig::new("http://localhost:1"), client.clone());

    reporter.report_event(TelemetryEvent::new("Resumed").with_session_id("earlier-session"));
    reporter.shutdown(Duration::from_secs(1)).await.unwrap();

    assert_eq!(client.delivered()[0].session_id, "earlier-session");
}

#[tokio::test]
async fn test_delivery_failures_are_swallowed() {
    let server = mock_collector(500).await;
    let reporter = reporter_for(&server, ReporterConfig::default());

    reporter.report_event(TelemetryEvent::new("Lost"));
    reporter.shutdown(Duration::from_secs(5)).await.unwrap();

    assert_eq!(received_events(&server).await.len(), 1);
    let snapshot = reporter.metrics().snapshot();
    assert_eq!(snapshot.failed, 1);
    assert_eq!(snapshot.delivered, 0);
}

#[tokio::test]
async fn test_unreachable_collector_is_swallowed() {
    // Bind then release a port so nothing is listening on it
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let reporter = Reporter::builder(ReporterConfig::new(format!("http://127.0.0.1:{port}")))
        .opt_out(Arc::new(OptOutFlag::new(false)))
        .build()
        .unwrap();

    reporter.report_event(TelemetryEvent::new("Offline"));
    reporter.shutdown(Duration::from_secs(5)).await.unwrap();

    assert_eq!(reporter.metrics().snapshot().failed, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_report_from_plain_thread() {
    let server = mock_collector(200).await;
    let reporter = Arc::new(reporter_for(&server, ReporterConfig::default()));

    let handle = {
        let reporter = Arc::clone(&reporter);
        std::thread::spawn(move || {
            reporter.report_event(TelemetryEvent::new("FromThread"));
        })
    };
    handle.join().unwrap();

    reporter.shutdown(Duration::from_secs(5)).await.unwrap();

    let events = received_events(&server).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].name, "FromThread");
}
