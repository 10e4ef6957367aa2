//! Utility modules
//!
//! - **error**: error type, HTTP mapping and retry policies
//! - **logging**: tracing subscriber setup

pub mod error;
pub mod logging;
