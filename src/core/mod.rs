//! Core functionality shared by the agent and the server
//!
//! - **metrics**: metric model and the in-memory store with merge rules
//! - **security**: payload signing, hybrid encryption and subnet gating
//! - **codec**: message framing (sign, encrypt, compress) and its reverse

pub mod codec;
pub mod metrics;
pub mod security;
