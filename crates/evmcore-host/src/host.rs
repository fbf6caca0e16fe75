//! The `Host` trait (§6): every piece of outside-the-interpreter state the
//! opcode handlers (C9) touch, collected behind one interface so the
//! interpreter crate never depends on `evmcore-host`'s concrete types.
//!
//! Modeled on the teacher's own host-trait usage (`host.sload(...)`,
//! `host.sstore(...)`, `host.basefee()`, `host.tx().gas_price()`, ...):
//! one object the execution loop threads through every handler.

use evmcore_primitives::{Address, Word, B256};

use crate::context::{BlockContext, TxContext};
use crate::database::DatabaseError;

/// Result of an `SLOAD`/`TLOAD`-shaped read: the value plus whether this
/// was the slot's first touch this transaction (`SLOAD` only — transient
/// storage has no cold/warm distinction).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SloadResult {
    pub value: Word,
    pub is_cold: bool,
}

/// Result of an `SSTORE`: the values `sstore_cost` needs (original,
/// current) plus the cold flag, all as observed *before* the write lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SstoreResult {
    pub original: Word,
    pub current: Word,
    pub is_cold: bool,
}

/// Everything the interpreter needs from the outside world while
/// executing a single frame (§5, §6). A `Journal` is the reference
/// implementation of this trait.
pub trait Host {
    // -- context --
    fn block(&self) -> &BlockContext;
    fn tx(&self) -> &TxContext;

    // -- balances / code, routed through access-list bookkeeping --
    fn balance(&mut self, addr: Address) -> Result<(Word, bool), DatabaseError>;
    fn code(&mut self, addr: Address) -> Result<(Vec<u8>, bool), DatabaseError>;
    fn code_hash(&mut self, addr: Address) -> Result<(B256, bool), DatabaseError>;
    fn code_size(&mut self, addr: Address) -> Result<(usize, bool), DatabaseError> {
        let (code, is_cold) = self.code(addr)?;
        Ok((code.len(), is_cold))
    }

    /// Marks `addr` touched for access-list purposes without reading
    /// anything, used by `CALL`'s own address-access surcharge.
    fn touch_address(&mut self, addr: Address) -> bool;

    // -- persistent storage (C6) --
    fn sload(&mut self, addr: Address, key: Word) -> Result<SloadResult, DatabaseError>;
    fn sstore(
        &mut self,
        addr: Address,
        key: Word,
        value: Word,
    ) -> Result<SstoreResult, DatabaseError>;

    // -- transient storage (EIP-1153) --
    fn tload(&self, addr: Address, key: Word) -> Word;
    fn tstore(&mut self, addr: Address, key: Word, value: Word);

    // -- nonce (CREATE address derivation) --
    fn nonce(&mut self, addr: Address) -> Result<u64, DatabaseError>;
    /// Increments `addr`'s nonce and returns the value it held beforehand
    /// (the nonce `CREATE`'s address derivation hashes against).
    fn increment_nonce(&mut self, addr: Address) -> Result<u64, DatabaseError>;

    // -- balance mutation (`CALL*`/`CREATE*` value transfer) --
    /// Moves `value` from `from` to `to`, or does nothing and returns
    /// `false` if `from`'s balance is insufficient. A self-transfer
    /// (`from == to`) always succeeds as a no-op.
    fn transfer(&mut self, from: Address, to: Address, value: Word) -> Result<bool, DatabaseError>;

    /// Installs `code` as `addr`'s deployed code (`CREATE*` on success).
    fn set_code(&mut self, addr: Address, code: Vec<u8>) -> Result<(), DatabaseError>;

    // -- block hash window --
    fn block_hash(&mut self, number: u64) -> Result<B256, DatabaseError>;

    // -- logs --
    fn log(&mut self, addr: Address, topics: Vec<B256>, data: Vec<u8>);

    // -- refund ledger --
    fn add_refund(&mut self, delta: i64);
    fn refund(&self) -> i64;

    // -- self destruct (C10/C11) --
    /// Registers `addr` for destruction at the end of the transaction,
    /// transferring its balance to `beneficiary`. Returns whether the
    /// beneficiary account was newly created (for `CALL_NEW_ACCOUNT_COST`
    /// style pricing) and whether this is the first time `addr` is marked
    /// in this transaction (post-Cancun/EIP-6780 semantics are the
    /// caller's concern, not the host's).
    fn mark_self_destruct(
        &mut self,
        addr: Address,
        beneficiary: Address,
    ) -> Result<bool, DatabaseError>;

    fn account_exists(&mut self, addr: Address) -> Result<bool, DatabaseError>;
}
