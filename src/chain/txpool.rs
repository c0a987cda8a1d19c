//! Snapshot of the node's pending transaction pool

use super::types::BlockTransaction;
use crate::codec::hex::parse_u64;
use crate::codec::Address;
use crate::error::ClientResult;

use serde::Deserialize;
use std::collections::HashMap;

/// Pending transactions of one account, keyed by decimal nonce string
pub type AccountPool = HashMap<String, BlockTransaction>;

#[derive(Debug, Clone, Default, Deserialize)]
struct RawTxpoolContent {
    #[serde(default)]
    pending: HashMap<String, AccountPool>,
    #[serde(default)]
    queued: HashMap<String, AccountPool>,
}

/// `txpool_content` result.
///
/// The node may report addresses in any case and in either `0x` or `FM`
/// notation, so lookups go through an index of address payloads built once
/// at decode time.
#[derive(Debug, Clone, Default)]
pub struct TxpoolContent {
    pending: HashMap<String, AccountPool>,
    queued: HashMap<String, AccountPool>,
    /// address payload -> key in `pending`
    pending_index: HashMap<String, String>,
}

impl TxpoolContent {
    pub fn new(
        pending: HashMap<String, AccountPool>,
        queued: HashMap<String, AccountPool>,
    ) -> Self {
        let pending_index = pending
            .keys()
            .map(|addr| (pool_key(addr), addr.clone()))
            .collect();
        Self {
            pending,
            queued,
            pending_index,
        }
    }

    pub fn from_value(value: &serde_json::Value) -> ClientResult<Self> {
        let raw: RawTxpoolContent = crate::rpc::value::decode_object(value, "txpool content")?;
        Ok(Self::new(raw.pending, raw.queued))
    }

    /// Pending transactions of `addr`, matched regardless of case and prefix
    pub fn pending_for(&self, addr: &str) -> Option<&AccountPool> {
        self.pending_index
            .get(&pool_key(addr))
            .and_then(|key| self.pending.get(key))
    }

    /// Number of pending transactions of `addr`
    pub fn pending_count(&self, addr: &str) -> usize {
        self.pending_for(addr).map(HashMap::len).unwrap_or(0)
    }

    /// Pending nonces of `addr`, ascending
    pub fn pending_nonces(&self, addr: &str) -> ClientResult<Vec<u64>> {
        let mut nonces = match self.pending_for(addr) {
            Some(pool) => pool
                .keys()
                .map(|n| parse_u64(n, 10, "pending nonce"))
                .collect::<ClientResult<Vec<u64>>>()?,
            None => Vec::new(),
        };
        nonces.sort_unstable();
        Ok(nonces)
    }

    pub fn pending(&self) -> &HashMap<String, AccountPool> {
        &self.pending
    }

    pub fn queued(&self) -> &HashMap<String, AccountPool> {
        &self.queued
    }
}

/// Lookup key for an address; keys that are not addresses are only lower-cased
fn pool_key(addr: &str) -> String {
    match Address::parse(addr) {
        Ok(address) => address.payload().to_string(),
        Err(_) => addr.trim().to_ascii_lowercase(),
    }
}
