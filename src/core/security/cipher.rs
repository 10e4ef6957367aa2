//! Hybrid payload encryption
//!
//! A fresh AES-256-GCM key encrypts the payload and is itself wrapped with
//! RSA-OAEP (SHA-256) under the server's public key. Wire layout:
//!
//! ```text
//! u16 BE wrapped key length | wrapped key | 12 byte nonce | ciphertext + tag
//! ```

use crate::utils::error::{MetricsError, Result};
use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, KeyInit},
};
use rand::RngCore;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use std::path::Path;

/// AES-256-GCM nonce size (96 bits / 12 bytes as recommended by NIST)
const AES_GCM_NONCE_SIZE: usize = 12;
const AES_GCM_TAG_SIZE: usize = 16;
const AES_KEY_SIZE: usize = 32;
const LENGTH_PREFIX_SIZE: usize = 2;

/// Agent side: encrypts with the server's public key
#[derive(Debug, Clone)]
pub struct PayloadEncryptor {
    public_key: RsaPublicKey,
}

impl PayloadEncryptor {
    pub fn new(public_key: RsaPublicKey) -> Self {
        Self { public_key }
    }

    /// Parse an SPKI or PKCS#1 PEM public key
    pub fn from_pem(pem: &str) -> Result<Self> {
        let public_key = RsaPublicKey::from_public_key_pem(pem)
            .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
            .map_err(|e| MetricsError::Crypto(format!("Invalid public key: {}", e)))?;
        Ok(Self::new(public_key))
    }

    pub async fn from_pem_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let pem = tokio::fs::read_to_string(path.as_ref()).await.map_err(|e| {
            MetricsError::Crypto(format!(
                "Failed to read public key {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_pem(&pem)
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut rng = rand::thread_rng();

        let mut key_bytes = [0u8; AES_KEY_SIZE];
        rng.fill_bytes(&mut key_bytes);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));

        let mut nonce_bytes = [0u8; AES_GCM_NONCE_SIZE];
        rng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| MetricsError::Crypto(format!("Encryption failed: {}", e)))?;

        let wrapped_key = self
            .public_key
            .encrypt(&mut rng, Oaep::new::<Sha256>(), &key_bytes)
            .map_err(|e| MetricsError::Crypto(format!("Key wrapping failed: {}", e)))?;
        let wrapped_len = u16::try_from(wrapped_key.len())
            .map_err(|_| MetricsError::Crypto("Wrapped key too long".to_string()))?;

        let mut output = Vec::with_capacity(
            LENGTH_PREFIX_SIZE + wrapped_key.len() + AES_GCM_NONCE_SIZE + ciphertext.len(),
        );
        output.extend_from_slice(&wrapped_len.to_be_bytes());
        output.extend_from_slice(&wrapped_key);
        output.extend_from_slice(&nonce_bytes);
        output.extend_from_slice(&ciphertext);
        Ok(output)
    }
}

/// Server side: decrypts with the private key
///
/// Every failure to open a payload is reported as forbidden.
#[derive(Debug, Clone)]
pub struct PayloadDecryptor {
    private_key: RsaPrivateKey,
}

impl PayloadDecryptor {
    pub fn new(private_key: RsaPrivateKey) -> Self {
        Self { private_key }
    }

    /// Parse a PKCS#8 or PKCS#1 PEM private key
    pub fn from_pem(pem: &str) -> Result<Self> {
        let private_key = RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
            .map_err(|e| MetricsError::Crypto(format!("Invalid private key: {}", e)))?;
        Ok(Self::new(private_key))
    }

    pub async fn from_pem_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let pem = tokio::fs::read_to_string(path.as_ref()).await.map_err(|e| {
            MetricsError::Crypto(format!(
                "Failed to read private key {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_pem(&pem)
    }

    /// Public half, for handing to agents
    pub fn encryptor(&self) -> PayloadEncryptor {
        PayloadEncryptor::new(self.private_key.to_public_key())
    }

    pub fn decrypt(&self, payload: &[u8]) -> Result<Vec<u8>> {
        if payload.len() < LENGTH_PREFIX_SIZE {
            return Err(MetricsError::forbidden("Encrypted payload too short"));
        }
        let wrapped_len = u16::from_be_bytes([payload[0], payload[1]]) as usize;
        let rest = &payload[LENGTH_PREFIX_SIZE..];

        if rest.len() < wrapped_len + AES_GCM_NONCE_SIZE + AES_GCM_TAG_SIZE {
            return Err(MetricsError::forbidden(
                "Encrypted payload too short - possible corruption or tampering",
            ));
        }
        let (wrapped_key, rest) = rest.split_at(wrapped_len);
        let (nonce_bytes, ciphertext) = rest.split_at(AES_GCM_NONCE_SIZE);

        let key_bytes = self
            .private_key
            .decrypt(Oaep::new::<Sha256>(), wrapped_key)
            .map_err(|e| MetricsError::forbidden(format!("Key unwrapping failed: {}", e)))?;
        if key_bytes.len() != AES_KEY_SIZE {
            return Err(MetricsError::forbidden("Unwrapped key has the wrong size"));
        }

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));
        cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|e| MetricsError::forbidden(format!("Decryption failed: {}", e)))
    }
}
