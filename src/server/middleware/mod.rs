//! HTTP middleware

pub mod helpers;
pub mod trusted_subnet;

pub use trusted_subnet::TrustedSubnetMiddleware;
