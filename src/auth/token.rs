//! Per-request token for the exchange API
//!
//! The token is `hex(HMAC-SHA256(key, decimal(timestamp)))`. The same
//! timestamp travels in the request's `time` field so the server can
//! recompute it.

use crate::error::{ClientError, ClientResult};

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Signs request timestamps with the shared API key
#[derive(Clone)]
pub struct TokenGenerator {
    /// Keyed MAC state, cloned for every token
    keyed: HmacSha256,
}

impl TokenGenerator {
    pub fn new(key: impl AsRef<[u8]>) -> ClientResult<Self> {
        let key = key.as_ref();
        if key.is_empty() {
            return Err(ClientError::Config("token key must not be empty".to_string()));
        }
        let keyed = HmacSha256::new_from_slice(key)
            .map_err(|e| ClientError::Crypto(format!("invalid token key: {}", e)))?;
        Ok(Self { keyed })
    }

    /// Token for a unix timestamp in seconds
    pub fn generate(&self, timestamp: i64) -> String {
        let mut mac = self.keyed.clone();
        mac.update(timestamp.to_string().as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

impl std::fmt::Debug for TokenGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenGenerator").field("key", &"<redacted>").finish()
    }
}
