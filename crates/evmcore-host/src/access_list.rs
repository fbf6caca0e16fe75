//! EIP-2929 access list (part of C6/C4): the two warm sets the spec
//! describes in §3 — "Access list" — plus the pre-warming rule ("Initially
//! warmed: `tx.origin`, `tx.to`, all precompile addresses").
//!
//! On a nested call's hard failure the access list is **not** rolled back
//! (P7): warmings it produced persist even though the call's other effects
//! are reverted. Callers therefore must not include [`AccessList`] in the
//! snapshot/revert machinery that covers the rest of world state.

use std::collections::HashSet;

use evmcore_primitives::{Address, Word};

/// Tracks which addresses and storage slots have been touched so far in
/// the current transaction.
#[derive(Debug, Default, Clone)]
pub struct AccessList {
    addresses: HashSet<Address>,
    storage_keys: HashSet<(Address, Word)>,
}

impl AccessList {
    /// An empty access list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-warms `tx.origin`, `tx.to` and every precompile address, per
    /// §3's "Initially warmed" rule.
    pub fn prewarm(&mut self, addresses: impl IntoIterator<Item = Address>) {
        self.addresses.extend(addresses);
    }

    /// Marks `addr` warm, returning whether it was cold (its *first*
    /// touch this transaction).
    pub fn touch_address(&mut self, addr: Address) -> bool {
        self.addresses.insert(addr)
    }

    /// `true` if `addr` has already been touched.
    #[must_use]
    pub fn is_warm_address(&self, addr: Address) -> bool {
        self.addresses.contains(&addr)
    }

    /// Marks `(addr, key)` warm, returning whether it was cold.
    ///
    /// Also warms `addr` itself, matching EIP-2929: a storage access
    /// implies an address access.
    pub fn touch_storage_key(&mut self, addr: Address, key: Word) -> bool {
        self.addresses.insert(addr);
        self.storage_keys.insert((addr, key))
    }

    /// `true` if `(addr, key)` has already been touched.
    #[must_use]
    pub fn is_warm_storage_key(&self, addr: Address, key: Word) -> bool {
        self.storage_keys.contains(&(addr, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_touch_is_cold_then_warm() {
        let mut list = AccessList::new();
        let addr = Address::with_last_byte(1);
        assert!(list.touch_address(addr)); // cold (newly inserted)
        assert!(!list.touch_address(addr)); // warm now
        assert!(list.is_warm_address(addr));
    }

    #[test]
    fn storage_key_touch_also_warms_address() {
        let mut list = AccessList::new();
        let addr = Address::with_last_byte(2);
        let key = Word::from(7u64);
        assert!(list.touch_storage_key(addr, key));
        assert!(list.is_warm_address(addr));
        assert!(!list.touch_storage_key(addr, key));
    }

    #[test]
    fn prewarm_marks_warm_without_reporting_cold() {
        let mut list = AccessList::new();
        let addr = Address::with_last_byte(3);
        list.prewarm([addr]);
        assert!(list.is_warm_address(addr));
        assert!(!list.touch_address(addr));
    }
}
