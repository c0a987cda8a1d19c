//! Account addresses in the two notations the chain exposes
//!
//! The node's JSON-RPC surface uses `0x`-prefixed hex, the exchange API an
//! `FM` prefix. The 40 hex digit payload is the same in both.

use crate::error::EncodingError;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub const RPC_PREFIX: &str = "0x";
pub const FM_PREFIX: &str = "FM";

/// Prefix `addr` with `0x` unless it already contains one
pub fn append_0x_to_address(addr: &str) -> String {
    if addr.contains(RPC_PREFIX) {
        addr.to_string()
    } else {
        format!("{}{}", RPC_PREFIX, addr)
    }
}

/// Prefix `addr` with `FM` unless it already contains one
pub fn append_fm_to_address(addr: &str) -> String {
    if addr.contains(FM_PREFIX) {
        addr.to_string()
    } else {
        format!("{}{}", FM_PREFIX, addr)
    }
}

/// Rewrite a `0x` address into `FM` notation
pub fn replace_0x_with_fm(addr: &str) -> String {
    match addr.strip_prefix(RPC_PREFIX) {
        Some(payload) => format!("{}{}", FM_PREFIX, payload),
        None => append_fm_to_address(addr),
    }
}

/// A validated account address.
///
/// Holds the lower-cased payload; equality is therefore case-insensitive
/// with respect to the input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Parse from `0x`, `FM` or bare notation
    pub fn parse(input: &str) -> Result<Self, EncodingError> {
        let trimmed = input.trim();
        let payload = trimmed
            .strip_prefix(FM_PREFIX)
            .or_else(|| trimmed.strip_prefix("fm"))
            .unwrap_or(trimmed);
        let payload = crate::codec::hex::strip_0x(payload).to_ascii_lowercase();

        if payload.len() != 40 {
            return Err(EncodingError::AddressLength { len: payload.len() });
        }
        if !payload.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(EncodingError::InvalidHex {
                field: "address",
                value: input.to_string(),
            });
        }
        Ok(Self(payload))
    }

    /// Lower-cased 40 character payload without prefix
    pub fn payload(&self) -> &str {
        &self.0
    }

    /// `0x` notation for the JSON-RPC surface
    pub fn to_rpc(&self) -> String {
        format!("{}{}", RPC_PREFIX, self.0)
    }

    /// `FM` notation for the exchange API surface
    pub fn to_fm(&self) -> String {
        format!("{}{}", FM_PREFIX, self.0)
    }
}

impl FromStr for Address {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", RPC_PREFIX, self.0)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_rpc())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::parse(&s).map_err(serde::de::Error::custom)
    }
}
