//! Codec module - addresses, quantities and contract call data
//!
//! This module provides:
//! - `0x` / `FM` address notation handling
//! - Hex and decimal big-integer parsing for both wire surfaces
//! - A fixed-width ABI encoder for `address` and `uint256` arguments

pub mod abi;
pub mod address;
pub mod hex;

pub use abi::{
    encode_address, encode_call, encode_uint256, selector, ParamValue, SolidityKind,
    SolidityParam, BALANCE_OF_SELECTOR, TRANSFER_SELECTOR,
};
pub use address::{append_0x_to_address, append_fm_to_address, replace_0x_with_fm, Address};
pub use self::hex::{parse_big, parse_u64, strip_0x, to_hex_prefixed};
