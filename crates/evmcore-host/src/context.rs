//! Block and transaction context (§6): the read-only environment the
//! `ORIGIN`/`GASPRICE`/`COINBASE`/`TIMESTAMP`/... opcode family reads from.
//! None of this is mutated by the interpreter; it is supplied once per
//! transaction by the caller.

use evmcore_primitives::{Address, Word, B256};
use serde::{Deserialize, Serialize};

/// Per-block environment, constant for the lifetime of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockContext {
    pub number: u64,
    pub coinbase: Address,
    pub timestamp: u64,
    pub gas_limit: u64,
    pub prevrandao: B256,
    pub base_fee: Word,
    pub chain_id: u64,
    /// `BLOBBASEFEE`, introduced by EIP-4844 (Cancun).
    pub blob_base_fee: Word,
}

impl BlockContext {
    /// Resolves `BLOCKHASH`'s "last 256 blocks" window against this
    /// block's number, returning `None` for an out-of-range argument
    /// before even reaching the database.
    #[must_use]
    pub fn is_in_blockhash_window(&self, queried: u64) -> bool {
        queried < self.number && self.number.saturating_sub(queried) <= 256
    }
}

/// Per-transaction environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxContext {
    pub origin: Address,
    pub gas_price: Word,
    /// EIP-4844 blob versioned hashes, read by `BLOBHASH`.
    pub blob_hashes: Vec<B256>,
}
