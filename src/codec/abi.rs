//! Contract call data for static `address` / `uint256` arguments
//!
//! Output follows the contract ABI calling convention: the 4-byte method
//! selector followed by one 32-byte slot per argument, hex encoded.

use crate::error::EncodingError;

use num_bigint::BigUint;
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

/// `transfer(address,uint256)`
pub const TRANSFER_SELECTOR: &str = "0xa9059cbb";

/// `balanceOf(address)`
pub const BALANCE_OF_SELECTOR: &str = "0x70a08231";

/// Hex characters in one 32-byte slot
const SLOT_WIDTH: usize = 64;

/// Argument kinds the encoder understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolidityKind {
    Address,
    Uint256,
}

impl FromStr for SolidityKind {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "address" => Ok(SolidityKind::Address),
            "uint256" | "uint" => Ok(SolidityKind::Uint256),
            other => Err(EncodingError::UnsupportedType(other.to_string())),
        }
    }
}

impl fmt::Display for SolidityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolidityKind::Address => f.write_str("address"),
            SolidityKind::Uint256 => f.write_str("uint256"),
        }
    }
}

/// Untyped argument value, checked against the kind at construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Text(String),
    Integer(BigUint),
}

/// A typed call argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolidityParam {
    Address(String),
    Uint256(BigUint),
}

impl SolidityParam {
    /// Build from a Solidity type name and a loosely typed value
    pub fn new(type_name: &str, value: ParamValue) -> Result<Self, EncodingError> {
        match (type_name.parse::<SolidityKind>()?, value) {
            (SolidityKind::Address, ParamValue::Text(s)) => Ok(SolidityParam::Address(s)),
            (SolidityKind::Uint256, ParamValue::Integer(n)) => Ok(SolidityParam::Uint256(n)),
            (kind, value) => Err(EncodingError::UnsupportedType(format!(
                "{} with value {:?}",
                kind, value
            ))),
        }
    }

    pub fn kind(&self) -> SolidityKind {
        match self {
            SolidityParam::Address(_) => SolidityKind::Address,
            SolidityParam::Uint256(_) => SolidityKind::Uint256,
        }
    }

    /// Encode into one 64 character hex slot
    pub fn encode(&self) -> Result<String, EncodingError> {
        match self {
            SolidityParam::Address(addr) => encode_address(addr),
            SolidityParam::Uint256(n) => encode_uint256(n),
        }
    }
}

/// Left-pad an address to 32 bytes
pub fn encode_address(addr: &str) -> Result<String, EncodingError> {
    let lower = addr.to_ascii_lowercase();
    let payload = lower.strip_prefix("0x").unwrap_or(&lower);

    if payload.len() != 40 {
        return Err(EncodingError::AddressLength { len: payload.len() });
    }
    if !payload.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(EncodingError::InvalidHex {
            field: "address",
            value: addr.to_string(),
        });
    }
    Ok(format!("{:0>width$}", payload, width = SLOT_WIDTH))
}

/// Left-pad an unsigned integer to 32 bytes
pub fn encode_uint256(value: &BigUint) -> Result<String, EncodingError> {
    let hex = value.to_str_radix(16);
    if hex.len() > SLOT_WIDTH {
        return Err(EncodingError::Overflow { hex_len: hex.len() });
    }
    Ok(format!("{:0>width$}", hex, width = SLOT_WIDTH))
}

/// Selector followed by every encoded argument, in order
pub fn encode_call(selector: &str, params: &[SolidityParam]) -> Result<String, EncodingError> {
    let mut data = String::with_capacity(selector.len() + params.len() * SLOT_WIDTH);
    data.push_str(selector);
    for param in params {
        data.push_str(&param.encode()?);
    }
    Ok(data)
}

/// `0x`-prefixed 4-byte selector of a canonical signature such as
/// `transfer(address,uint256)`
pub fn selector(signature: &str) -> String {
    let hash = Keccak256::digest(signature.as_bytes());
    format!("0x{}", hex::encode(&hash[..4]))
}

/// Call data for `transfer(to, amount)`
pub fn token_transfer_data(to: &str, amount: &BigUint) -> Result<String, EncodingError> {
    encode_call(
        TRANSFER_SELECTOR,
        &[
            SolidityParam::Address(to.to_string()),
            SolidityParam::Uint256(amount.clone()),
        ],
    )
}

/// Call data for `balanceOf(owner)`
pub fn balance_of_data(owner: &str) -> Result<String, EncodingError> {
    encode_call(BALANCE_OF_SELECTOR, &[SolidityParam::Address(owner.to_string())])
}
