//! The journal (C6/§6): wires a [`Database`] together with the access
//! list, the per-transaction "original value" map `SSTORE` pricing needs,
//! the refund counter, transient storage, emitted logs and pending
//! self-destructs, and a snapshot stack for call-frame revert (§5's "a
//! failed call unwinds exactly the state it touched").

use std::collections::HashMap;

use evmcore_primitives::{Address, Word, B256};
use serde::{Deserialize, Serialize};

use crate::access_list::AccessList;
use crate::context::{BlockContext, TxContext};
use crate::database::{Database, DatabaseError};
use crate::host::{Host, SloadResult, SstoreResult};

/// A log emitted by `LOG0`-`LOG4`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Vec<u8>,
}

/// A pending `SELFDESTRUCT`, applied once the transaction commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfDestructRecord {
    pub address: Address,
    pub beneficiary: Address,
}

/// One level of the call-frame revert stack: everything a `revert`
/// invalidates beyond the database's own snapshot.
struct JournalSnapshot {
    db_snapshot: u64,
    refund: i64,
    log_count: usize,
    self_destruct_count: usize,
    // EIP-1153: transient storage is rolled back like ordinary state on a
    // revert, unlike the access list (EIP-2929), which is not.
    transient: HashMap<(Address, Word), Word>,
}

/// Ties a [`Database`] to the bookkeeping a transaction needs beyond raw
/// reads and writes: access list, refund counter, transient storage,
/// logs, self-destructs, and nested snapshot/revert.
pub struct Journal<DB> {
    db: DB,
    block: BlockContext,
    tx: TxContext,
    access_list: AccessList,
    /// First value observed for `(address, key)` this transaction, used
    /// by `sstore_cost`'s `original` parameter (EIP-2200).
    original_storage: HashMap<(Address, Word), Word>,
    transient_storage: HashMap<(Address, Word), Word>,
    refund: i64,
    logs: Vec<LogEntry>,
    self_destructs: Vec<SelfDestructRecord>,
    snapshots: Vec<JournalSnapshot>,
}

impl<DB: Database> Journal<DB> {
    /// Starts a new transaction journal. `warm_addresses` seeds the
    /// access list per §3's "Initially warmed" rule (`tx.origin`, `tx.to`,
    /// precompile addresses).
    pub fn new(
        db: DB,
        block: BlockContext,
        tx: TxContext,
        warm_addresses: impl IntoIterator<Item = Address>,
    ) -> Self {
        let mut access_list = AccessList::new();
        access_list.prewarm(warm_addresses);
        Self {
            db,
            block,
            tx,
            access_list,
            original_storage: HashMap::new(),
            transient_storage: HashMap::new(),
            refund: 0,
            logs: Vec::new(),
            self_destructs: Vec::new(),
            snapshots: Vec::new(),
        }
    }

    /// Begins a new call frame, returning a handle [`Journal::revert`] or
    /// [`Journal::commit`] later consumes.
    pub fn checkpoint(&mut self) -> usize {
        let snap = JournalSnapshot {
            db_snapshot: self.db.snapshot(),
            refund: self.refund,
            log_count: self.logs.len(),
            self_destruct_count: self.self_destructs.len(),
            transient: self.transient_storage.clone(),
        };
        self.snapshots.push(snap);
        self.snapshots.len() - 1
    }

    /// Unwinds every mutation made since `checkpoint`, per §5: database
    /// writes, refund, logs, self-destructs and transient storage all
    /// roll back. The access list does **not** (EIP-2929's warm set
    /// survives a reverted nested call).
    pub fn revert(&mut self, checkpoint: usize) {
        let snap = self.snapshots.split_off(checkpoint).into_iter().next().expect("valid checkpoint");
        self.db.revert(snap.db_snapshot);
        self.refund = snap.refund;
        self.logs.truncate(snap.log_count);
        self.self_destructs.truncate(snap.self_destruct_count);
        self.transient_storage = snap.transient;
    }

    /// Discards the checkpoint without undoing anything (the call
    /// succeeded).
    pub fn commit(&mut self, checkpoint: usize) {
        let snap = self.snapshots.split_off(checkpoint).into_iter().next().expect("valid checkpoint");
        self.db.commit(snap.db_snapshot);
    }

    /// Consumes the journal, returning the accumulated logs and
    /// self-destructs for the caller to apply to the backing database.
    pub fn finish(self) -> (DB, Vec<LogEntry>, Vec<SelfDestructRecord>, i64) {
        (self.db, self.logs, self.self_destructs, self.refund)
    }

    /// Logs emitted so far, in emission order. Unlike [`Journal::finish`]
    /// this borrows rather than consumes, so a caller still mid-transaction
    /// (e.g. finalizing a root frame's [`ExecutionResult`](crate)) can read
    /// them without giving up the journal.
    #[must_use]
    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    /// Pending self-destructs recorded so far, in the same sense as
    /// [`Journal::logs`].
    #[must_use]
    pub fn self_destructs(&self) -> &[SelfDestructRecord] {
        &self.self_destructs
    }

    fn original_value(&mut self, addr: Address, key: Word) -> Result<Word, DatabaseError> {
        if let Some(&v) = self.original_storage.get(&(addr, key)) {
            return Ok(v);
        }
        let v = self.db.get_storage(addr, key)?;
        self.original_storage.insert((addr, key), v);
        Ok(v)
    }
}

impl<DB: Database> Host for Journal<DB> {
    fn block(&self) -> &BlockContext {
        &self.block
    }

    fn tx(&self) -> &TxContext {
        &self.tx
    }

    fn balance(&mut self, addr: Address) -> Result<(Word, bool), DatabaseError> {
        let is_cold = self.access_list.touch_address(addr);
        Ok((self.db.get_balance(addr)?, is_cold))
    }

    fn code(&mut self, addr: Address) -> Result<(Vec<u8>, bool), DatabaseError> {
        let is_cold = self.access_list.touch_address(addr);
        Ok((self.db.get_code(addr)?, is_cold))
    }

    fn code_hash(&mut self, addr: Address) -> Result<(B256, bool), DatabaseError> {
        let is_cold = self.access_list.touch_address(addr);
        Ok((self.db.get_code_hash(addr)?, is_cold))
    }

    fn touch_address(&mut self, addr: Address) -> bool {
        self.access_list.touch_address(addr)
    }

    fn sload(&mut self, addr: Address, key: Word) -> Result<SloadResult, DatabaseError> {
        let is_cold = self.access_list.touch_storage_key(addr, key);
        let value = self.db.get_storage(addr, key)?;
        // Establish the original-value baseline on first touch so later
        // SSTOREs in this transaction price against it, not a re-read.
        self.original_value(addr, key)?;
        Ok(SloadResult { value, is_cold })
    }

    fn sstore(
        &mut self,
        addr: Address,
        key: Word,
        value: Word,
    ) -> Result<SstoreResult, DatabaseError> {
        let is_cold = self.access_list.touch_storage_key(addr, key);
        let original = self.original_value(addr, key)?;
        let current = self.db.get_storage(addr, key)?;
        self.db.set_storage(addr, key, value)?;
        Ok(SstoreResult {
            original,
            current,
            is_cold,
        })
    }

    fn tload(&self, addr: Address, key: Word) -> Word {
        self.transient_storage
            .get(&(addr, key))
            .copied()
            .unwrap_or(Word::ZERO)
    }

    fn tstore(&mut self, addr: Address, key: Word, value: Word) {
        self.transient_storage.insert((addr, key), value);
    }

    fn nonce(&mut self, addr: Address) -> Result<u64, DatabaseError> {
        self.db.get_nonce(addr)
    }

    fn increment_nonce(&mut self, addr: Address) -> Result<u64, DatabaseError> {
        let current = self.db.get_nonce(addr)?;
        self.db.set_nonce(addr, current + 1)?;
        Ok(current)
    }

    fn transfer(&mut self, from: Address, to: Address, value: Word) -> Result<bool, DatabaseError> {
        if from == to || value.is_zero() {
            return Ok(true);
        }
        let from_balance = self.db.get_balance(from)?;
        if from_balance < value {
            return Ok(false);
        }
        let to_balance = self.db.get_balance(to)?;
        self.db.set_balance(from, from_balance - value)?;
        self.db.set_balance(to, to_balance + value)?;
        Ok(true)
    }

    fn set_code(&mut self, addr: Address, code: Vec<u8>) -> Result<(), DatabaseError> {
        self.db.set_code(addr, code)
    }

    fn block_hash(&mut self, number: u64) -> Result<B256, DatabaseError> {
        if !self.block.is_in_blockhash_window(number) {
            return Ok(B256::ZERO);
        }
        self.db.block_hash(number)
    }

    fn log(&mut self, address: Address, topics: Vec<B256>, data: Vec<u8>) {
        self.logs.push(LogEntry { address, topics, data });
    }

    fn add_refund(&mut self, delta: i64) {
        self.refund += delta;
    }

    fn refund(&self) -> i64 {
        self.refund
    }

    fn mark_self_destruct(
        &mut self,
        addr: Address,
        beneficiary: Address,
    ) -> Result<bool, DatabaseError> {
        let beneficiary_is_new = !self.db.account_exists(beneficiary)?;
        let balance = self.db.get_balance(addr)?;
        let beneficiary_balance = self.db.get_balance(beneficiary)?;
        if addr != beneficiary {
            self.db.set_balance(addr, Word::ZERO)?;
            self.db.set_balance(beneficiary, beneficiary_balance + balance)?;
        }
        self.self_destructs.push(SelfDestructRecord { address: addr, beneficiary });
        Ok(beneficiary_is_new)
    }

    fn account_exists(&mut self, addr: Address) -> Result<bool, DatabaseError> {
        self.db.account_exists(addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::InMemoryDb;

    fn test_context() -> (BlockContext, TxContext) {
        (
            BlockContext {
                number: 100,
                coinbase: Address::ZERO,
                timestamp: 0,
                gas_limit: 30_000_000,
                prevrandao: B256::ZERO,
                base_fee: Word::ZERO,
                chain_id: 1,
                blob_base_fee: Word::ZERO,
            },
            TxContext {
                origin: Address::with_last_byte(1),
                gas_price: Word::ZERO,
                blob_hashes: Vec::new(),
            },
        )
    }

    #[test]
    fn sload_first_touch_is_cold() {
        let (block, tx) = test_context();
        let mut j = Journal::new(InMemoryDb::new(), block, tx, []);
        let addr = Address::with_last_byte(2);
        let r1 = j.sload(addr, Word::from(1u64)).unwrap();
        assert!(r1.is_cold);
        let r2 = j.sload(addr, Word::from(1u64)).unwrap();
        assert!(!r2.is_cold);
    }

    #[test]
    fn sstore_original_value_survives_intermediate_writes() {
        let (block, tx) = test_context();
        let mut j = Journal::new(InMemoryDb::new(), block, tx, []);
        let addr = Address::with_last_byte(2);
        let key = Word::from(1u64);
        let r1 = j.sstore(addr, key, Word::from(5u64)).unwrap();
        assert_eq!(r1.original, Word::ZERO);
        assert_eq!(r1.current, Word::ZERO);
        let r2 = j.sstore(addr, key, Word::from(9u64)).unwrap();
        assert_eq!(r2.original, Word::ZERO);
        assert_eq!(r2.current, Word::from(5u64));
    }

    #[test]
    fn revert_undoes_storage_refund_and_logs_but_not_access_list() {
        let (block, tx) = test_context();
        let mut j = Journal::new(InMemoryDb::new(), block, tx, []);
        let addr = Address::with_last_byte(2);
        let key = Word::from(1u64);
        let cp = j.checkpoint();
        j.sstore(addr, key, Word::from(5u64)).unwrap();
        j.add_refund(100);
        j.log(addr, vec![], vec![1, 2, 3]);
        j.revert(cp);
        assert_eq!(j.sload(addr, key).unwrap().value, Word::ZERO);
        assert_eq!(j.refund(), 0);
        assert!(j.logs.is_empty());
        // access list is not rolled back: the slot touched above is warm.
        assert!(j.access_list.is_warm_storage_key(addr, key));
    }

    #[test]
    fn transient_storage_rolls_back_on_revert() {
        let (block, tx) = test_context();
        let mut j = Journal::new(InMemoryDb::new(), block, tx, []);
        let addr = Address::with_last_byte(2);
        let key = Word::from(1u64);
        let cp = j.checkpoint();
        j.tstore(addr, key, Word::from(42u64));
        assert_eq!(j.tload(addr, key), Word::from(42u64));
        j.revert(cp);
        assert_eq!(j.tload(addr, key), Word::ZERO);
    }
}
