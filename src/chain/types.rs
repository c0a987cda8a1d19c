//! Chain entities decoded from node and exchange API responses

use crate::codec::hex::{parse_u64, strip_0x};
use crate::error::{ClientError, ClientResult};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Accept a string, a number or null for a text field
fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

/// A transaction as returned inside blocks, by hash lookups and in the pool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockTransaction {
    #[serde(default, deserialize_with = "text")]
    pub hash: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub from: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub to: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub value: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub gas: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub gas_price: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub nonce: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub input: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub block_hash: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub block_number: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub transaction_index: Option<String>,
    /// Fields this client does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Entry of a block's transaction list: a bare hash or the full object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockTxEntry {
    Hash(String),
    Full(BlockTransaction),
}

impl BlockTxEntry {
    pub fn hash(&self) -> Option<&str> {
        match self {
            BlockTxEntry::Hash(h) => Some(h),
            BlockTxEntry::Full(tx) => tx.hash.as_deref(),
        }
    }
}

/// Block as decoded, before its height has been parsed
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBlock {
    #[serde(default, deserialize_with = "text")]
    pub hash: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub parent_hash: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub number: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub timestamp: Option<String>,
    /// The exchange API names this list `list`
    #[serde(default, alias = "list")]
    pub transactions: Vec<BlockTxEntry>,
}

/// A block with a parsed height
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub height: u64,
    pub hash: String,
    pub parent_hash: String,
    pub transactions: Vec<BlockTxEntry>,
}

/// Summary of a block for scanners
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockHeader {
    pub hash: String,
    pub previous_hash: String,
    pub height: u64,
    /// Unix seconds at which the header was produced locally
    pub time: u64,
}

impl Block {
    /// Parse the height of `raw` using `radix` (16 for the node, 10 for
    /// the exchange API)
    pub fn from_raw(raw: RawBlock, radix: u32) -> ClientResult<Self> {
        let number = raw.number.ok_or(ClientError::MissingField("number"))?;
        let digits = if radix == 16 { &number[..] } else { strip_0x(&number) };
        let height = parse_u64(digits, radix, "block number")?;

        Ok(Self {
            height,
            hash: raw.hash.unwrap_or_default(),
            parent_hash: raw.parent_hash.unwrap_or_default(),
            transactions: raw.transactions,
        })
    }

    pub fn header(&self) -> BlockHeader {
        BlockHeader {
            hash: self.hash.clone(),
            previous_hash: self.parent_hash.clone(),
            height: self.height,
            time: chrono::Utc::now().timestamp().max(0) as u64,
        }
    }

    pub fn tx_hashes(&self) -> Vec<&str> {
        self.transactions.iter().filter_map(BlockTxEntry::hash).collect()
    }
}

/// Receipt of a mined transaction
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    #[serde(default, deserialize_with = "text")]
    pub transaction_hash: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub block_hash: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub block_number: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub from: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub to: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub gas_used: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub cumulative_gas_used: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub contract_address: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub status: Option<String>,
    #[serde(default)]
    pub logs: Vec<Value>,
}

impl TransactionReceipt {
    /// `Some(true)` for status `0x1`, `None` if the node omitted status
    pub fn succeeded(&self) -> ClientResult<Option<bool>> {
        match self.status.as_deref() {
            Some(status) => Ok(Some(parse_u64(status, 16, "receipt status")? == 1)),
            None => Ok(None),
        }
    }
}

/// Pool counters from `txpool_status`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxpoolStatus {
    pub pending: u64,
    pub queued: u64,
}

/// Block reference accepted by state reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockTag {
    #[default]
    Latest,
    Pending,
}

impl BlockTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockTag::Latest => "latest",
            BlockTag::Pending => "pending",
        }
    }
}

impl FromStr for BlockTag {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "latest" => Ok(BlockTag::Latest),
            "pending" => Ok(BlockTag::Pending),
            other => Err(ClientError::InvalidArgument(format!(
                "unknown block tag {:?}",
                other
            ))),
        }
    }
}

impl fmt::Display for BlockTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
