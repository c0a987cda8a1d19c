//! Big-integer (de)serialization for the two wire surfaces
//!
//! The JSON-RPC surface carries quantities as `0x`-prefixed hex, the exchange
//! API as decimal strings. Every call site names the radix it expects.

use crate::error::{ClientError, ClientResult};

use num_bigint::BigUint;

/// Strip a leading `0x`/`0X` if present
pub fn strip_0x(input: &str) -> &str {
    input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input)
}

/// Digits of `input` for `radix`, rejecting empty or out-of-radix input.
/// Hex input may carry a `0x` prefix.
fn digits<'a>(input: &'a str, radix: u32, what: &'static str) -> ClientResult<&'a str> {
    let body = if radix == 16 { strip_0x(input) } else { input };
    if body.is_empty() || !body.chars().all(|c| c.is_digit(radix)) {
        return Err(ClientError::parse(what, input));
    }
    Ok(body)
}

/// Parse an arbitrary-precision unsigned integer
pub fn parse_big(input: &str, radix: u32, what: &'static str) -> ClientResult<BigUint> {
    let body = digits(input, radix, what)?;
    BigUint::parse_bytes(body.as_bytes(), radix).ok_or_else(|| ClientError::parse(what, input))
}

/// Parse a `u64`, failing on overflow as well as on bad digits
pub fn parse_u64(input: &str, radix: u32, what: &'static str) -> ClientResult<u64> {
    let body = digits(input, radix, what)?;
    u64::from_str_radix(body, radix).map_err(|_| ClientError::parse(what, input))
}

/// Render as RPC quantity, e.g. `0x3e8`
pub fn to_hex_prefixed(value: &BigUint) -> String {
    format!("0x{}", value.to_str_radix(16))
}
