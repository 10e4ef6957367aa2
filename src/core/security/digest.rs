//! `HashSHA256` digest creation and verification
//!
//! The default scheme is a plain SHA-256 of the plaintext body; the shared
//! key only switches the check on. `hmac_sha256` keys the digest with the
//! secret for deployments where both ends opt in.

use crate::utils::error::{MetricsError, Result};
use hmac::{Hmac, Mac, digest::KeyInit as HmacKeyInit};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// How the `HashSHA256` value is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureScheme {
    /// Hex SHA-256 of the body
    #[default]
    Sha256,
    /// Hex HMAC-SHA256 of the body keyed by the shared secret
    HmacSha256,
}

impl std::str::FromStr for SignatureScheme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" => Ok(SignatureScheme::Sha256),
            "hmac_sha256" | "hmac-sha256" | "hmac" => Ok(SignatureScheme::HmacSha256),
            other => Err(format!("Unknown signature scheme: {}", other)),
        }
    }
}

/// Computes and verifies body digests once a shared key is configured
#[derive(Clone)]
pub struct Signer {
    secret: Vec<u8>,
    scheme: SignatureScheme,
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("secret", &"[REDACTED]")
            .field("scheme", &self.scheme)
            .finish()
    }
}

impl Signer {
    /// Plain SHA-256 digests
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self::with_scheme(secret, SignatureScheme::Sha256)
    }

    pub fn with_scheme(secret: impl AsRef<[u8]>, scheme: SignatureScheme) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
            scheme,
        }
    }

    pub fn scheme(&self) -> SignatureScheme {
        self.scheme
    }

    /// Hex-encoded digest of `data`
    pub fn sign(&self, data: &[u8]) -> Result<String> {
        match self.scheme {
            SignatureScheme::Sha256 => Ok(hex::encode(Sha256::digest(data))),
            SignatureScheme::HmacSha256 => {
                let mut mac = <HmacSha256 as HmacKeyInit>::new_from_slice(&self.secret)
                    .map_err(|e| MetricsError::Crypto(format!("Invalid HMAC key: {}", e)))?;
                mac.update(data);
                Ok(hex::encode(mac.finalize().into_bytes()))
            }
        }
    }

    /// Check `signature` against `data`, case-insensitively on the hex digits
    pub fn verify(&self, data: &[u8], signature: &str) -> Result<bool> {
        let expected_signature = self.sign(data)?;
        Ok(constant_time_eq(
            &expected_signature,
            &signature.trim().to_ascii_lowercase(),
        ))
    }
}

/// Constant-time string comparison
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (a_byte, b_byte) in a.bytes().zip(b.bytes()) {
        result |= a_byte ^ b_byte;
    }

    result == 0
}
