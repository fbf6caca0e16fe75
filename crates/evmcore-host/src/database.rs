//! The world-state database contract (§6): accounts, balances, code and
//! persistent storage, accessed through a narrow synchronous interface.
//! The production backing store stays out of scope (§1); [`InMemoryDb`] is
//! the reference implementation used by this engine's own tests.

use std::collections::HashMap;

use evmcore_primitives::{Address, Word, B256};
use thiserror::Error;

use alloy_primitives::keccak256;

/// Errors a [`Database`] implementation may surface. The interpreter never
/// constructs these itself — they propagate from the host.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DatabaseError {
    /// The backing store is unavailable or returned malformed data.
    #[error("database backend error: {0}")]
    Backend(String),
}

/// Synchronous world-state read/write surface (§6). Implementations may be
/// backed by asynchronous storage but must expose this synchronous view to
/// the interpreter (§5).
pub trait Database {
    /// Reads an account's wei balance (`0` for a non-existent account).
    fn get_balance(&self, addr: Address) -> Result<Word, DatabaseError>;
    /// Overwrites an account's wei balance.
    fn set_balance(&mut self, addr: Address, balance: Word) -> Result<(), DatabaseError>;

    /// Reads an account's nonce (`0` for a non-existent account).
    fn get_nonce(&self, addr: Address) -> Result<u64, DatabaseError>;
    /// Overwrites an account's nonce.
    fn set_nonce(&mut self, addr: Address, nonce: u64) -> Result<(), DatabaseError>;

    /// Reads an account's code (empty for a non-existent/EOA account).
    fn get_code(&self, addr: Address) -> Result<Vec<u8>, DatabaseError>;
    /// Installs code for an account (used by `CREATE`/`CREATE2` on
    /// successful deployment).
    fn set_code(&mut self, addr: Address, code: Vec<u8>) -> Result<(), DatabaseError>;
    /// `keccak256` of the account's code, or `B256::ZERO` if the account
    /// does not exist, matching `EXTCODEHASH`'s "empty account" case.
    fn get_code_hash(&self, addr: Address) -> Result<B256, DatabaseError>;

    /// `true` if an account has ever been touched (exists with non-empty
    /// code/balance/nonce, or was explicitly created).
    fn account_exists(&self, addr: Address) -> Result<bool, DatabaseError>;

    /// Reads a persistent storage slot (`0` if never written).
    fn get_storage(&self, addr: Address, key: Word) -> Result<Word, DatabaseError>;
    /// Writes a persistent storage slot.
    fn set_storage(&mut self, addr: Address, key: Word, value: Word) -> Result<(), DatabaseError>;

    /// Block hash of a recent block (`B256::ZERO` if out of the retained
    /// window), backing the `BLOCKHASH` opcode.
    fn block_hash(&self, number: u64) -> Result<B256, DatabaseError>;

    /// Captures a point the caller can later [`Database::revert`] to.
    fn snapshot(&mut self) -> u64;
    /// Rolls back every mutation made since `id` was taken.
    fn revert(&mut self, id: u64);
    /// Discards the ability to revert to `id` (the call succeeded).
    fn commit(&mut self, id: u64);
}

#[derive(Debug, Clone, Default)]
struct Account {
    balance: Word,
    nonce: u64,
    code: Vec<u8>,
    storage: HashMap<Word, Word>,
}

/// A trivial in-memory [`Database`], suitable for tests and as a worked
/// example of the contract — not a production world-state store (that is
/// explicitly out of scope, §1).
#[derive(Debug, Default)]
pub struct InMemoryDb {
    accounts: HashMap<Address, Account>,
    block_hashes: HashMap<u64, B256>,
    // Snapshots are whole-state clones keyed by a monotonically increasing
    // id; adequate for tests, not for production-scale state.
    snapshots: HashMap<u64, HashMap<Address, Account>>,
    next_snapshot_id: u64,
}

impl InMemoryDb {
    /// An empty world state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an account's balance, used by tests to fund a caller.
    pub fn set_balance_for_test(&mut self, addr: Address, balance: Word) {
        self.accounts.entry(addr).or_default().balance = balance;
    }

    /// Seeds an account's code, used by tests to install a callee contract.
    pub fn set_code_for_test(&mut self, addr: Address, code: Vec<u8>) {
        self.accounts.entry(addr).or_default().code = code;
    }

    /// Seeds a recent block hash, used by `BLOCKHASH` tests.
    pub fn set_block_hash_for_test(&mut self, number: u64, hash: B256) {
        self.block_hashes.insert(number, hash);
    }
}

impl Database for InMemoryDb {
    fn get_balance(&self, addr: Address) -> Result<Word, DatabaseError> {
        Ok(self.accounts.get(&addr).map_or(Word::ZERO, |a| a.balance))
    }

    fn set_balance(&mut self, addr: Address, balance: Word) -> Result<(), DatabaseError> {
        self.accounts.entry(addr).or_default().balance = balance;
        Ok(())
    }

    fn get_nonce(&self, addr: Address) -> Result<u64, DatabaseError> {
        Ok(self.accounts.get(&addr).map_or(0, |a| a.nonce))
    }

    fn set_nonce(&mut self, addr: Address, nonce: u64) -> Result<(), DatabaseError> {
        self.accounts.entry(addr).or_default().nonce = nonce;
        Ok(())
    }

    fn get_code(&self, addr: Address) -> Result<Vec<u8>, DatabaseError> {
        Ok(self.accounts.get(&addr).map_or_else(Vec::new, |a| a.code.clone()))
    }

    fn set_code(&mut self, addr: Address, code: Vec<u8>) -> Result<(), DatabaseError> {
        self.accounts.entry(addr).or_default().code = code;
        Ok(())
    }

    fn get_code_hash(&self, addr: Address) -> Result<B256, DatabaseError> {
        Ok(self
            .accounts
            .get(&addr)
            .filter(|a| !a.code.is_empty())
            .map_or(B256::ZERO, |a| keccak256(&a.code)))
    }

    fn account_exists(&self, addr: Address) -> Result<bool, DatabaseError> {
        Ok(self.accounts.contains_key(&addr))
    }

    fn get_storage(&self, addr: Address, key: Word) -> Result<Word, DatabaseError> {
        Ok(self
            .accounts
            .get(&addr)
            .and_then(|a| a.storage.get(&key))
            .copied()
            .unwrap_or(Word::ZERO))
    }

    fn set_storage(&mut self, addr: Address, key: Word, value: Word) -> Result<(), DatabaseError> {
        self.accounts.entry(addr).or_default().storage.insert(key, value);
        Ok(())
    }

    fn block_hash(&self, number: u64) -> Result<B256, DatabaseError> {
        Ok(self.block_hashes.get(&number).copied().unwrap_or(B256::ZERO))
    }

    fn snapshot(&mut self) -> u64 {
        let id = self.next_snapshot_id;
        self.next_snapshot_id += 1;
        self.snapshots.insert(id, self.accounts.clone());
        id
    }

    fn revert(&mut self, id: u64) {
        if let Some(state) = self.snapshots.remove(&id) {
            self.accounts = state;
        }
        self.snapshots.retain(|&k, _| k < id);
    }

    fn commit(&mut self, id: u64) {
        self.snapshots.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_revert_round_trip() {
        let mut db = InMemoryDb::new();
        let addr = Address::ZERO;
        db.set_balance(addr, Word::from(100u64)).unwrap();
        let snap = db.snapshot();
        db.set_balance(addr, Word::from(1u64)).unwrap();
        assert_eq!(db.get_balance(addr).unwrap(), Word::from(1u64));
        db.revert(snap);
        assert_eq!(db.get_balance(addr).unwrap(), Word::from(100u64));
    }

    #[test]
    fn commit_drops_snapshot_without_reverting() {
        let mut db = InMemoryDb::new();
        let addr = Address::ZERO;
        let snap = db.snapshot();
        db.set_balance(addr, Word::from(5u64)).unwrap();
        db.commit(snap);
        assert_eq!(db.get_balance(addr).unwrap(), Word::from(5u64));
    }
}
