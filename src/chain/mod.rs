//! Chain module - typed reads of blocks, balances, nonces and the tx pool
//!
//! This module provides:
//! - Decoded chain entities (blocks, transactions, receipts)
//! - A pending-pool snapshot with case-insensitive address lookup
//! - `ChainReader`, the typed read surface over both transports

pub mod reader;
pub mod txpool;
pub mod types;

pub use reader::ChainReader;
pub use txpool::{AccountPool, TxpoolContent};
pub use types::{
    Block, BlockHeader, BlockTag, BlockTransaction, BlockTxEntry, RawBlock, TransactionReceipt,
    TxpoolStatus,
};
