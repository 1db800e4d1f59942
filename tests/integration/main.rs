//! Integration tests for newsbot
//!
//! These tests use wiremock to stand in for feed servers, the ingestion
//! endpoint and the backing store, and drive full runs end-to-end.

mod common;
mod config_tests;
mod run_tests;
