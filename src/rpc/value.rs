//! Tag-checked access to decoded result values
//!
//! Every accessor returns a typed error carrying the observed tag and the raw
//! payload instead of assuming the server sent the expected shape.

use crate::error::{ClientError, ClientResult, JsonKind};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

pub fn expect_string(value: &Value) -> ClientResult<&str> {
    value
        .as_str()
        .ok_or_else(|| ClientError::shape(JsonKind::String, value))
}

pub fn expect_object(value: &Value) -> ClientResult<&Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| ClientError::shape(JsonKind::Object, value))
}

pub fn expect_array(value: &Value) -> ClientResult<&Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| ClientError::shape(JsonKind::Array, value))
}

/// Decimal text of a JSON number
pub fn expect_number_text(value: &Value) -> ClientResult<String> {
    match value {
        Value::Number(n) => Ok(n.to_string()),
        other => Err(ClientError::shape(JsonKind::Number, other)),
    }
}

/// Member of an object, `Null` when absent
pub fn field<'a>(value: &'a Value, name: &str) -> &'a Value {
    value.get(name).unwrap_or(&Value::Null)
}

/// Decode an object-shaped value into `T`
pub fn decode_object<T: DeserializeOwned>(value: &Value, what: &str) -> ClientResult<T> {
    expect_object(value)?;
    serde_json::from_value(value.clone()).map_err(|e| ClientError::Decode {
        what: what.to_string(),
        message: format!("{} in {}", e, value),
    })
}
