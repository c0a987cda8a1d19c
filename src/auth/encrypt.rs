//! RSA encryption of payloads sent to the exchange API

use crate::error::{ClientError, ClientResult};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::{Pkcs1v15Encrypt, RsaPublicKey};

/// Encrypts strings with the API's RSA public key (PKCS#1 v1.5)
#[derive(Debug, Clone)]
pub struct PayloadEncryptor {
    public_key: RsaPublicKey,
}

impl PayloadEncryptor {
    /// Build from a base64 encoded PKCS#1 DER public key
    pub fn from_base64_der(encoded: &str) -> ClientResult<Self> {
        let der = STANDARD
            .decode(encoded.trim())
            .map_err(|e| ClientError::Crypto(format!("public key is not base64: {}", e)))?;
        let public_key = RsaPublicKey::from_pkcs1_der(&der)
            .map_err(|e| ClientError::Crypto(format!("invalid PKCS#1 public key: {}", e)))?;
        Ok(Self { public_key })
    }

    /// Base64 of the ciphertext
    pub fn encrypt(&self, data: &str) -> ClientResult<String> {
        let mut rng = rand::thread_rng();
        let ciphertext = self
            .public_key
            .encrypt(&mut rng, Pkcs1v15Encrypt, data.as_bytes())
            .map_err(|e| ClientError::Crypto(format!("rsa encryption failed: {}", e)))?;
        Ok(STANDARD.encode(ciphertext))
    }
}
