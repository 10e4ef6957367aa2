//! Error handling utilities
//!
//! This module provides the crate error type, its HTTP mapping, and retry policies.

pub mod error;
pub mod recovery;

// Re-export commonly used types
pub use error::*;
pub use recovery::*;
