//! Common test utilities

pub mod assertions;
pub mod fixtures;

pub use fixtures::*;
