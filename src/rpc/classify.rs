//! Success/error classification of response envelopes
//!
//! The exchange API answers `{"status":"success","data":...}` or
//! `{"status":"fail","code":N,"msg":"..."}`. The deployed client applies the
//! same predicate to JSON-RPC answers from the node as well, so a node reply
//! without `status` is treated as a failure. [`StatusClassifier`] keeps that
//! behaviour; [`JsonRpcClassifier`] reads standard JSON-RPC 2.0 errors for
//! the node and can be selected in configuration.

use crate::error::{ClientError, ClientResult};

use serde_json::Value;
use std::fmt::Debug;

/// Decides whether a parsed response body is a success
pub trait ResponseClassifier: Send + Sync + Debug {
    /// Body returned by the node's JSON-RPC endpoint
    fn classify_rpc(&self, body: &Value) -> ClientResult<()>;

    /// Body returned by the exchange API
    fn classify_api(&self, body: &Value) -> ClientResult<()>;
}

/// The `status` envelope predicate, applied to both surfaces
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusClassifier;

impl ResponseClassifier for StatusClassifier {
    fn classify_rpc(&self, body: &Value) -> ClientResult<()> {
        classify_status_envelope(body)
    }

    fn classify_api(&self, body: &Value) -> ClientResult<()> {
        classify_status_envelope(body)
    }
}

/// JSON-RPC 2.0 rules for the node, `status` envelope for the API
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRpcClassifier;

impl ResponseClassifier for JsonRpcClassifier {
    fn classify_rpc(&self, body: &Value) -> ClientResult<()> {
        if let Some(error) = body.get("error").filter(|e| !e.is_null()) {
            return Err(ClientError::Protocol {
                code: int_field(error.get("code")),
                msg: text_field(error.get("message")),
            });
        }
        if body.get("result").is_none() {
            return Err(ClientError::EmptyResponse);
        }
        Ok(())
    }

    fn classify_api(&self, body: &Value) -> ClientResult<()> {
        classify_status_envelope(body)
    }
}

/// `status == "success"` with a `data` member, otherwise `[code]msg`
pub fn classify_status_envelope(body: &Value) -> ClientResult<()> {
    if body.get("status").and_then(Value::as_str) == Some("success") {
        if body.get("data").is_none() {
            return Err(ClientError::EmptyResponse);
        }
        return Ok(());
    }

    Err(ClientError::Protocol {
        code: int_field(body.get("code")),
        msg: text_field(body.get("msg")),
    })
}

/// Integer reading of a loosely typed field; absent or non-numeric is 0
fn int_field(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        Some(Value::Bool(true)) => 1,
        _ => 0,
    }
}

/// Text reading of a loosely typed field; absent or null is empty
fn text_field(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        None | Some(Value::Null) => String::new(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope() {
        let body = json!({"status": "success", "data": {"balance": "100"}});
        assert!(classify_status_envelope(&body).is_ok());
    }

    #[test]
    fn test_success_with_null_data_is_not_empty() {
        let body = json!({"status": "success", "data": null});
        assert!(classify_status_envelope(&body).is_ok());
    }

    #[test]
    fn test_success_without_data_is_empty() {
        let body = json!({"status": "success"});
        assert!(matches!(
            classify_status_envelope(&body),
            Err(ClientError::EmptyResponse)
        ));
    }

    #[test]
    fn test_fail_envelope_message() {
        let body = json!({"status": "fail", "code": 3, "msg": "bad token"});
        let err = classify_status_envelope(&body).unwrap_err();
        assert_eq!(err.to_string(), "[3]bad token");
    }

    #[test]
    fn test_string_code_and_missing_msg() {
        let body = json!({"status": "fail", "code": "12"});
        assert_eq!(classify_status_envelope(&body).unwrap_err().to_string(), "[12]");
    }

    #[test]
    fn test_plain_jsonrpc_success_is_rejected_by_status_rule() {
        let body = json!({"jsonrpc": "2.0", "id": 1, "result": "0x10"});
        let err = StatusClassifier.classify_rpc(&body).unwrap_err();
        assert_eq!(err.to_string(), "[0]");
    }

    #[test]
    fn test_status_must_match_exactly() {
        let body = json!({"status": "SUCCESS", "data": {}});
        assert!(classify_status_envelope(&body).is_err());
    }

    #[test]
    fn test_jsonrpc_classifier() {
        let ok = json!({"jsonrpc": "2.0", "id": 1, "result": "0x10"});
        assert!(JsonRpcClassifier.classify_rpc(&ok).is_ok());

        let null_result = json!({"jsonrpc": "2.0", "id": 1, "result": null});
        assert!(JsonRpcClassifier.classify_rpc(&null_result).is_ok());

        let failed = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32000, "message": "nonce too low"}
        });
        assert_eq!(
            JsonRpcClassifier.classify_rpc(&failed).unwrap_err().to_string(),
            "[-32000]nonce too low"
        );

        let api = json!({"status": "fail", "code": 3, "msg": "bad token"});
        assert!(JsonRpcClassifier.classify_api(&api).is_err());
    }
}
