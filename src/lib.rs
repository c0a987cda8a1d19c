//! FM chain client - typed access to an FM chain node and its exchange API
//!
//! Reads chain state (blocks, balances, nonces, the pending pool) over the
//! node's JSON-RPC endpoint and the signed exchange API, and builds,
//! estimates and submits native and token transfers.

pub mod auth;
pub mod chain;
pub mod codec;
pub mod config;
pub mod error;
pub mod metrics;
pub mod rpc;
pub mod tx;

pub use auth::{PayloadEncryptor, TokenGenerator};
pub use chain::{BlockTag, ChainReader};
pub use codec::Address;
pub use config::Settings;
pub use error::{ClientError, ClientResult, EncodingError};
pub use rpc::RpcClient;
pub use tx::{NonceSequencer, Submitter, TransactionBuilder};
