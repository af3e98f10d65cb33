//! Integration tests for beacon-reporter
//!
//! Run with: cargo test -p beacon-reporter --test integration

mod common;
mod test_reporter;
