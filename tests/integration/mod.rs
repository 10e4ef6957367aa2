//! Integration tests for metrics-relay
//!
//! These tests exercise real components together without mocking.

pub mod pipeline_tests;
pub mod storage_tests;
pub mod store_tests;
