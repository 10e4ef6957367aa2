//! Message framing
//!
//! The agent seals a JSON body in the order sign, encrypt, compress. The
//! server opens it in reverse; gzip is undone by the HTTP layer before the
//! body reaches [`MessageOpener`].

pub mod compression;

use crate::core::security::{PayloadDecryptor, PayloadEncryptor, Signer};
use crate::utils::error::{MetricsError, Result};

/// A body ready to be put on the wire
#[derive(Debug, Clone)]
pub struct SealedMessage {
    /// Gzip-compressed, possibly encrypted, payload
    pub body: Vec<u8>,
    /// Hex digest of the plaintext, when a key is configured
    pub signature: Option<String>,
}

/// Agent-side framing
#[derive(Debug, Clone, Default)]
pub struct MessageSealer {
    signer: Option<Signer>,
    encryptor: Option<PayloadEncryptor>,
}

impl MessageSealer {
    pub fn new(signer: Option<Signer>, encryptor: Option<PayloadEncryptor>) -> Self {
        Self { signer, encryptor }
    }

    pub fn seal(&self, plaintext: &[u8]) -> Result<SealedMessage> {
        let signature = self
            .signer
            .as_ref()
            .map(|signer| signer.sign(plaintext))
            .transpose()?;

        let body = match &self.encryptor {
            Some(encryptor) => compression::compress(&encryptor.encrypt(plaintext)?)?,
            None => compression::compress(plaintext)?,
        };

        Ok(SealedMessage { body, signature })
    }
}

/// A verified plaintext body
#[derive(Debug, Clone)]
pub struct OpenedMessage {
    pub plaintext: Vec<u8>,
    /// Digest to echo back, present when the request carried a signature
    pub digest: Option<String>,
}

/// Server-side framing
#[derive(Debug, Clone, Default)]
pub struct MessageOpener {
    signer: Option<Signer>,
    decryptor: Option<PayloadDecryptor>,
    require_signature: bool,
}

impl MessageOpener {
    pub fn new(
        signer: Option<Signer>,
        decryptor: Option<PayloadDecryptor>,
        require_signature: bool,
    ) -> Self {
        Self {
            signer,
            decryptor,
            require_signature,
        }
    }

    /// Decrypt when a private key is configured, then check the signature
    ///
    /// The signature is only checked when the request carries one, unless
    /// signatures are required.
    pub fn open(&self, body: &[u8], signature: Option<&str>) -> Result<OpenedMessage> {
        let plaintext = match &self.decryptor {
            Some(decryptor) => decryptor.decrypt(body)?,
            None => body.to_vec(),
        };

        let signature = signature.map(str::trim).filter(|s| !s.is_empty());
        let digest = match (&self.signer, signature) {
            (Some(signer), Some(signature)) => {
                let digest = signer.sign(&plaintext)?;
                if !signer.verify(&plaintext, signature)? {
                    return Err(MetricsError::signature_mismatch(digest));
                }
                Some(digest)
            }
            (Some(_), None) if self.require_signature => {
                return Err(MetricsError::bad_request("HashSHA256 signature required"));
            }
            _ => None,
        };

        Ok(OpenedMessage { plaintext, digest })
    }

    pub fn is_encrypted(&self) -> bool {
        self.decryptor.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::RsaPrivateKey;

    #[test]
    fn test_plain_message() {
        let sealed = MessageSealer::default().seal(b"{}").unwrap();
        assert!(sealed.signature.is_none());

        let body = compression::decompress(&sealed.body).unwrap();
        let opened = MessageOpener::default().open(&body, None).unwrap();
        assert_eq!(opened.plaintext, b"{}");
        assert!(opened.digest.is_none());
    }

    #[test]
    fn test_signed_encrypted_message() {
        let decryptor =
            PayloadDecryptor::new(RsaPrivateKey::new(&mut rand::thread_rng(), 1024).unwrap());
        let sealer = MessageSealer::new(Some(Signer::new("k")), Some(decryptor.encryptor()));
        let opener = MessageOpener::new(Some(Signer::new("k")), Some(decryptor), false);

        let plaintext = br#"{"id":"Temp","type":"gauge","value":36.6}"#;
        let sealed = sealer.seal(plaintext).unwrap();
        let body = compression::decompress(&sealed.body).unwrap();
        assert_ne!(&body[..], &plaintext[..]);

        let opened = opener.open(&body, sealed.signature.as_deref()).unwrap();
        assert_eq!(opened.plaintext, plaintext);
        assert_eq!(opened.digest, sealed.signature);
    }

    #[test]
    fn test_signature_mismatch_carries_digest() {
        let opener = MessageOpener::new(Some(Signer::new("k")), None, false);
        let result = opener.open(b"{}", Some("deadbeef"));
        let expected = Signer::new("k").sign(b"{}").unwrap();
        assert!(matches!(
            result,
            Err(MetricsError::SignatureMismatch { digest }) if digest == expected
        ));
    }

    #[test]
    fn test_plain_sha256_header_accepted() {
        use sha2::{Digest, Sha256};

        let opener = MessageOpener::new(Some(Signer::new("k")), None, false);
        let body = br#"{"id":"Temp","type":"gauge","value":36.6}"#;
        let header = hex::encode(Sha256::digest(body));

        let opened = opener.open(body, Some(&header)).unwrap();
        assert_eq!(opened.digest.as_deref(), Some(header.as_str()));
    }

    #[test]
    fn test_unsigned_body_allowed_unless_required() {
        let lenient = MessageOpener::new(Some(Signer::new("k")), None, false);
        assert!(lenient.open(b"{}", None).is_ok());

        let strict = MessageOpener::new(Some(Signer::new("k")), None, true);
        assert!(matches!(
            strict.open(b"{}", None),
            Err(MetricsError::BadRequest(_))
        ));
    }

    #[test]
    fn test_signature_ignored_without_key() {
        let opened = MessageOpener::default().open(b"{}", Some("anything")).unwrap();
        assert!(opened.digest.is_none());
    }
}
