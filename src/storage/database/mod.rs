//! Database storage implementation using SeaORM
//!
//! This module provides the relational metrics backend (SQLite or PostgreSQL).

/// Database entities module
pub mod entities;
/// Database migration module
pub mod migration;
/// SeaORM database implementation module
pub mod seaorm_db;

pub use seaorm_db::{DatabaseBackendType, DatabaseStorage};
