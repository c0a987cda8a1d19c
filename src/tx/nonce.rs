//! Nonce selection from the pending transaction pool
//!
//! Handles:
//! - Detection of the contiguous nonce run at the bottom of an account's pool
//! - Gap detection against the account nonce reported by the exchange API
//! - Choosing the next nonce that does not collide with queued transactions

use crate::chain::{ChainReader, TxpoolContent};
use crate::codec::Address;
use crate::error::{ClientResult, ResultExt};

use tracing::{debug, warn};

/// Contiguous run of pending nonces starting at the lowest one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NonceRun {
    pub min: u64,
    pub max: u64,
    pub count: u64,
}

impl NonceRun {
    /// Run at the start of an ascending nonce list; anything after the first
    /// gap is ignored
    pub fn from_sorted(nonces: &[u64]) -> Self {
        let mut iter = nonces.iter().copied();
        let first = match iter.next() {
            Some(n) => n,
            None => return Self::default(),
        };

        let mut run = Self {
            min: first,
            max: first,
            count: 1,
        };
        for nonce in iter {
            if Some(nonce) != run.max.checked_add(1) {
                break;
            }
            run.max = nonce;
            run.count += 1;
        }
        run
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Next nonce given the account nonce reported by the chain: one past
    /// the run when the run covers it, the chain nonce otherwise
    pub fn next_nonce(&self, chain_nonce: u64) -> u64 {
        if !self.is_empty() && self.min <= chain_nonce && chain_nonce <= self.max {
            self.max.saturating_add(1)
        } else {
            chain_nonce
        }
    }
}

impl TxpoolContent {
    /// Contiguous pending nonce run of `addr`; `(0, 0, 0)` if it has none
    pub fn sequential_nonce_run(&self, addr: &str) -> ClientResult<NonceRun> {
        let nonces = self.pending_nonces(addr)?;
        Ok(NonceRun::from_sorted(&nonces))
    }
}

/// Combines the account nonce and the pending pool into the next safe nonce
#[derive(Debug, Clone)]
pub struct NonceSequencer {
    reader: ChainReader,
}

impl NonceSequencer {
    pub fn new(reader: ChainReader) -> Self {
        Self { reader }
    }

    pub async fn next_nonce(&self, address: &Address) -> ClientResult<u64> {
        let chain_nonce = self.reader.nonce(address).await?;
        let pool = self.reader.txpool_content().await?;
        let run = pool
            .sequential_nonce_run(&address.to_rpc())
            .with_context(|| format!("sequence nonces of {}", address))?;

        let pending = pool.pending_count(&address.to_rpc()) as u64;
        if pending > run.count {
            warn!(
                "Nonce gap in pool for {}: {} pending, contiguous {}..={}",
                address, pending, run.min, run.max
            );
        }
        if !run.is_empty() && run.min > chain_nonce {
            warn!(
                "Nonce gap for {}: chain at {}, pool starts at {}",
                address, chain_nonce, run.min
            );
        }

        let next = run.next_nonce(chain_nonce);
        debug!(
            "Next nonce for {}: {} (chain {}, run {:?})",
            address, next, chain_nonce, run
        );
        Ok(next)
    }
}
