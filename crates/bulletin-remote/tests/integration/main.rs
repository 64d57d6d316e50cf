//! Integration tests for bulletin-remote
//!
//! Uses wiremock to simulate the REST table API and verifies request
//! shapes, response decoding, and status mapping end to end.

mod common;

mod test_errors;
mod test_fetch;
mod test_upsert;
