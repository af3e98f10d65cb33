//! Shared test helpers for collector integration tests

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use beacon_client::HttpEventClient;

/// Starts a mock collector answering `POST /v1alpha1/events` with `status`
/// and returns it with a client pointed at it.
pub async fn setup_collector(status: u16) -> (MockServer, HttpEventClient) {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1alpha1/events"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;

    let client = HttpEventClient::new(reqwest::Client::new(), server.uri());

    (server, client)
}
