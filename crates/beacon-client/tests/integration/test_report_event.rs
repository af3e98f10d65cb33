//! Integration tests for HttpEventClient::report_event()

use beacon_client::{DeliveryClient, DeliveryError, HttpEventClient};
use beacon_core::{StackFrame, TelemetryEvent, TelemetryEventKind};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common;

#[tokio::test]
async fn test_report_event_posts_json_body() {
    let (server, client) = common::setup_collector(200).await;

    let event = TelemetryEvent::new("TestEvent")
        .with_kind(TelemetryEventKind::Error)
        .with_value("key1", "value1")
        .with_stack_trace(vec![StackFrame::new("main.rs", "main", 10)])
        .with_tag("test-tag");

    client
        .report_event(&event)
        .await
        .expect("report_event failed");

    let requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 1);

    let request = &requests[0];
    assert_eq!(
        request
            .headers
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("application/json")
    );

    let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
    assert_eq!(body["name"], "TestEvent");
    assert_eq!(body["kind"], "error");
    assert_eq!(body["values"]["key1"], "value1");
    assert_eq!(body["stack_trace"][0]["line"], 10);
    assert_eq!(body["tags"][0], "test-tag");
    // Empty fields are left out of the document entirely
    assert!(body.get("session_id").is_none());
    assert!(body.get("message").is_none());
    assert!(body.get("timestamp").is_none());
}

#[tokio::test]
async fn test_report_event_non_200_is_failure() {
    let (_server, client) = common::setup_collector(503).await;

    let err = client
        .report_event(&TelemetryEvent::new("TestEvent"))
        .await
        .expect_err("503 must fail");

    match err {
        DeliveryError::UnexpectedStatus(status) => assert_eq!(status.as_u16(), 503),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_report_event_other_2xx_is_failure() {
    let (_server, client) = common::setup_collector(202).await;

    let result = client.report_event(&TelemetryEvent::new("TestEvent")).await;
    assert!(matches!(result, Err(DeliveryError::UnexpectedStatus(_))));
}

#[tokio::test]
async fn test_report_event_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1alpha1/events"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client =
        HttpEventClient::new(reqwest::Client::new(), server.uri()).with_auth_token("test-token");

    client
        .report_event(&TelemetryEvent::new("TestEvent"))
        .await
        .expect("authorized report failed");

    server.verify().await;
}

#[tokio::test]
async fn test_report_event_without_token_has_no_auth_header() {
    let (server, client) = common::setup_collector(200).await;

    client
        .report_event(&TelemetryEvent::new("TestEvent"))
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_report_event_connection_refused() {
    // Reserve a free port, then release it so nothing listens there
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = HttpEventClient::new(reqwest::Client::new(), format!("http://{addr}"));
    let result = client.report_event(&TelemetryEvent::new("TestEvent")).await;

    assert!(matches!(result, Err(DeliveryError::Request(_))));
}
