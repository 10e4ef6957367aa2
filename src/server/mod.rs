//! HTTP ingestion server
//!
//! Routes, middleware and the shared state behind them. Message opening and
//! replay protection live in [`receiver`].

pub mod middleware;
pub mod receiver;
pub mod routes;
pub mod server;
pub mod state;

pub use receiver::{Ingested, Receiver};
pub use server::HttpServer;
pub use state::AppState;
