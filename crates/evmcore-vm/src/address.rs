//! `CREATE`/`CREATE2` address derivation (C10).

use alloy_primitives::keccak256;
use evmcore_primitives::{Address, Word};

/// `keccak256(rlp(sender, nonce))[12..]`, the address a plain `CREATE`
/// deploys to. `nonce` is the sender's nonce *before* this create
/// increments it.
#[must_use]
pub fn create_address(sender: Address, nonce: u64) -> Address {
    sender.create(nonce)
}

/// `keccak256(0xff ++ sender ++ salt ++ keccak256(init_code))[12..]`, the
/// address a `CREATE2` deploys to.
#[must_use]
pub fn create2_address(sender: Address, salt: Word, init_code: &[u8]) -> Address {
    let init_code_hash = keccak256(init_code);
    sender.create2(salt.to_be_bytes::<32>(), init_code_hash)
}

/// Converts a popped stack word to an address, taking the low 20 bytes
/// per the `CALL`/`SELFDESTRUCT` convention (high bytes are simply
/// discarded, not validated as zero).
#[must_use]
pub fn word_to_address(w: Word) -> Address {
    let bytes = w.to_be_bytes::<32>();
    Address::from_slice(&bytes[12..])
}

/// An address widened back to a 256-bit stack word (`CREATE`'s success
/// push, `ADDRESS`, ...).
#[must_use]
pub fn address_to_word(addr: Address) -> Word {
    let mut bytes = [0u8; 32];
    bytes[12..].copy_from_slice(addr.as_slice());
    Word::from_be_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_address_changes_with_nonce() {
        let sender = Address::with_last_byte(1);
        assert_ne!(create_address(sender, 0), create_address(sender, 1));
    }

    #[test]
    fn create2_address_is_deterministic() {
        let sender = Address::with_last_byte(1);
        let salt = Word::from(42u64);
        let init_code = [0x60, 0x00];
        let a = create2_address(sender, salt, &init_code);
        let b = create2_address(sender, salt, &init_code);
        assert_eq!(a, b);
    }

    #[test]
    fn word_address_round_trip() {
        let addr = Address::with_last_byte(0xAB);
        assert_eq!(word_to_address(address_to_word(addr)), addr);
    }
}
