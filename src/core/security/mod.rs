//! Payload security
//!
//! - **digest**: SHA-256 (or keyed HMAC-SHA256) digests carried in the `HashSHA256` header
//! - **cipher**: hybrid RSA-OAEP / AES-256-GCM payload encryption
//! - **subnet**: trusted subnet matching for agent addresses

pub mod cipher;
pub mod digest;
pub mod subnet;

pub use cipher::{PayloadDecryptor, PayloadEncryptor};
pub use digest::{SignatureScheme, Signer, constant_time_eq};
pub use subnet::TrustedSubnet;

/// Header carrying the hex SHA-256 digest of the plaintext body
pub const HASH_HEADER: &str = "HashSHA256";
