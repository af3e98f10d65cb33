//! Integration tests for beacon-client
//!
//! Uses wiremock to stand in for the telemetry collector and checks the
//! request shape and the status handling of `HttpEventClient`.

mod common;

mod test_report_event;
