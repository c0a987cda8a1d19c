//! Transaction module - assembly, gas estimation, nonce selection and submission
//!
//! This module provides:
//! - Transfer parameters for native and token transfers
//! - Gas estimation and fee bookkeeping
//! - Next-nonce selection from the pending pool
//! - Raw and node-signed submission, including unlock / send / lock

mod builder;
mod gas;
mod nonce;
mod sender;

pub use builder::{
    GasEstimateRequest, PreparedTransfer, SendParams, TransactionBuilder, TransferIntent,
    TransferParams, TransferParamsBuilder,
};
pub use gas::{GasEstimator, TxFeeInfo};
pub use nonce::{NonceRun, NonceSequencer};
pub use sender::{AccountLocker, NodeAccountLocker, SendReceipt, Submitter};
