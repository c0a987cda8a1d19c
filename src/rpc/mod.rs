//! RPC module - request envelopes, transport and response classification
//!
//! This module provides:
//! - A JSON-RPC 2.0 call shape for the node
//! - A signed `time`/`token` call shape for the exchange API
//! - Pluggable success/error classification of response envelopes
//! - Tag-checked accessors for decoded results

pub mod classify;
pub mod transport;
pub mod value;

pub use classify::{JsonRpcClassifier, ResponseClassifier, StatusClassifier};
pub use transport::RpcClient;
