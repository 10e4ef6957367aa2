//! Error recovery utilities
//!
//! This module provides retry policies used by the agent transport and the database backend.

mod retry;
mod types;

pub use retry::RetryPolicy;
pub use types::{Backoff, RetryConfig};
