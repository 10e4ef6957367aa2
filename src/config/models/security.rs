//! Security configuration

use crate::core::security::{SignatureScheme, Signer};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Signing, encryption and network gating
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SecurityConfig {
    /// Shared secret; enables the `HashSHA256` digest
    #[serde(default)]
    pub key: Option<String>,
    /// Plain SHA-256 or keyed HMAC-SHA256
    #[serde(default)]
    pub signature_scheme: SignatureScheme,
    /// PEM key file: public key on the agent, private key on the server
    #[serde(default)]
    pub crypto_key: Option<PathBuf>,
    /// CIDR of hosts allowed to push metrics
    #[serde(default)]
    pub trusted_subnet: Option<String>,
    /// Reject unsigned bodies when a key is configured
    #[serde(default)]
    pub require_signature: bool,
}

impl SecurityConfig {
    /// Shared secret, ignoring an empty value
    pub fn signing_key(&self) -> Option<&str> {
        self.key.as_deref().filter(|k| !k.is_empty())
    }

    /// Digest signer, present when a key is configured
    pub fn signer(&self) -> Option<Signer> {
        self.signing_key()
            .map(|key| Signer::with_scheme(key, self.signature_scheme))
    }

    /// Trusted subnet, ignoring an empty value
    pub fn subnet(&self) -> Option<&str> {
        self.trusted_subnet
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Validate security configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.require_signature && self.signing_key().is_none() {
            return Err("require_signature needs a signing key".to_string());
        }

        if let Some(path) = &self.crypto_key {
            if !path.exists() {
                return Err(format!("Crypto key file not found: {}", path.display()));
            }
        }

        if let Some(subnet) = self.subnet() {
            crate::core::security::TrustedSubnet::parse(subnet).map_err(|e| e.to_string())?;
        }

        Ok(())
    }
}
