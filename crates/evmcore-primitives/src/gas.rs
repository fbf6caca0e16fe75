//! Gas schedule (C4): per-opcode static costs plus the formulas for every
//! dynamic cost the spec calls out — memory expansion, copy words,
//! `KECCAK256`/`LOG*` word costs, `EXP` exponent-byte cost, access-list
//! cold/warm surcharges, the `SSTORE` EIP-2200/3529 table, and `CALL*`/
//! `CREATE*` costs.
//!
//! Static costs are aggregated per basic block by the analyzer (C7) and
//! charged once by the block prologue (C8). Dynamic costs are charged by
//! the individual opcode handler (C9) at execution time, per the
//! "Invariants of the stream" in §3 of the spec.

use crate::{opcode, SpecId};

// ---- named constants (yellow-paper tier names plus EIP-2929/2200/3529/150
// call/create constants) ----

pub const G_ZERO: u64 = 0;
pub const G_JUMPDEST: u64 = 1;
pub const G_BASE: u64 = 2;
pub const G_VERYLOW: u64 = 3;
pub const G_LOW: u64 = 5;
pub const G_MID: u64 = 8;
pub const G_HIGH: u64 = 10;
pub const G_BLOCKHASH: u64 = 20;

pub const G_EXP: u64 = 10;
pub const G_EXPBYTE: u64 = 50;

pub const G_KECCAK256: u64 = 30;
pub const G_KECCAK256WORD: u64 = 6;

pub const G_COPY: u64 = 3;
pub const G_MEMORY: u64 = 3;

pub const G_LOG: u64 = 375;
pub const G_LOGDATA: u64 = 8;
pub const G_LOGTOPIC: u64 = 375;

/// EIP-2929: cost of the first touch of an address in a transaction.
pub const COLD_ACCOUNT_ACCESS_COST: u64 = 2600;
/// EIP-2929: cost of a subsequent touch of an already-warm address.
pub const WARM_ACCOUNT_ACCESS_COST: u64 = 100;
/// EIP-2929: cost of the first touch of a storage slot in a transaction.
pub const COLD_SLOAD_COST: u64 = 2100;
/// EIP-2929: cost of a subsequent touch of an already-warm storage slot,
/// and the sentinel "nothing changed" `SSTORE` cost (`WARM_STORAGE_READ`).
pub const WARM_STORAGE_READ_COST: u64 = 100;

/// Pre-Berlin flat `SLOAD` cost (no access-list distinction existed yet).
pub const SLOAD_FLAT_COST: u64 = 50;
/// Pre-Berlin flat `BALANCE`/`EXTCODESIZE`/`EXTCODEHASH` cost.
pub const EXTCODE_FLAT_COST: u64 = 700;
/// Pre-Istanbul `SSTORE` flat cost for a no-op write in the `current ==
/// new` case (Istanbul replaced this with [`WARM_STORAGE_READ_COST`]).
pub const SSTORE_NOOP_FLAT_COST: u64 = 200;

/// EIP-2200 `SSTORE_SET`: zero -> non-zero.
pub const SSTORE_SET: u64 = 20_000;
/// EIP-2929 `SSTORE_RESET`: non-zero -> different non-zero (post-Berlin;
/// folds in the cold-slot charge that pre-Berlin was a separate 5000).
pub const SSTORE_RESET: u64 = 2900;
/// Pre-Berlin `SSTORE_RESET`.
pub const SSTORE_RESET_PRE_BERLIN: u64 = 5000;
/// EIP-3529 (London) refund for clearing a slot to zero.
pub const SSTORE_CLEARS_SCHEDULE: u64 = 4800;
/// Pre-London refund for clearing a slot to zero.
pub const SSTORE_CLEARS_SCHEDULE_PRE_LONDON: u64 = 15_000;
/// EIP-1706: below this remaining gas, `SSTORE` is forbidden outright.
pub const SSTORE_STIPEND_GUARD: u64 = 2300;

pub const CALL_STIPEND: u64 = 2300;
pub const CALL_VALUE_COST: u64 = 9000;
pub const CALL_NEW_ACCOUNT_COST: u64 = 25_000;
pub const CALL_BASE_COST: u64 = 100;

pub const CREATE_BASE_COST: u64 = 32_000;
pub const CREATE_DATA_BYTE_COST: u64 = 200;
/// EIP-3860: `INITCODE_WORD_COST`, charged per 32-byte word of init code on
/// both `CREATE` and `CREATE2`.
pub const INITCODE_WORD_COST: u64 = 2;

/// Pre-EIP-3529 `SELFDESTRUCT` refund.
pub const SELFDESTRUCT_REFUND: u64 = 24_000;

/// Maximum deployed contract bytecode size (EIP-170).
pub const MAX_CODE_SIZE: usize = 24_576;
/// Maximum init-code size (EIP-3860, active from Shanghai).
pub const MAX_INITCODE_SIZE: usize = 2 * MAX_CODE_SIZE;

/// The static, block-aggregatable gas cost of an opcode (§4.4). Opcodes
/// whose cost is entirely dynamic (memory expansion, access lists,
/// sub-calls, `SSTORE`, ...) return `0` here; the handler charges the rest
/// at execution time.
#[must_use]
pub fn static_gas(op: u8, spec: SpecId) -> u64 {
    use opcode::*;

    if is_push(op) || is_dup(op) || is_swap(op) {
        return G_VERYLOW;
    }

    match op {
        STOP | RETURN | REVERT | INVALID => G_ZERO,
        ADD | SUB | NOT | LT | GT | SLT | SGT | EQ | ISZERO | AND | OR | XOR | BYTE | SHL
        | SHR | SAR | CALLDATALOAD | MLOAD | MSTORE | MSTORE8 | PUSH0 | RETURNDATALOAD => {
            G_VERYLOW
        }
        MUL | DIV | SDIV | MOD | SMOD | SIGNEXTEND => G_LOW,
        ADDMOD | MULMOD | JUMP => G_MID,
        JUMPI => G_HIGH,
        JUMPDEST => G_JUMPDEST,
        ADDRESS | ORIGIN | CALLER | CALLVALUE | CALLDATASIZE | CODESIZE | GASPRICE
        | RETURNDATASIZE | COINBASE | TIMESTAMP | NUMBER | PREVRANDAO | GASLIMIT | CHAINID
        | BASEFEE | BLOBBASEFEE | BLOBHASH | POP | PC | MSIZE | GAS => G_BASE,
        SELFBALANCE => G_LOW,
        BLOCKHASH => G_BLOCKHASH,
        EXP => G_EXP,
        KECCAK256 => G_KECCAK256,
        CODECOPY | CALLDATACOPY | RETURNDATACOPY => G_VERYLOW,
        MCOPY => {
            if spec.enabled_mcopy() {
                G_VERYLOW
            } else {
                G_ZERO
            }
        }
        TLOAD | TSTORE => {
            if spec.enabled_transient_storage() {
                WARM_STORAGE_READ_COST
            } else {
                G_ZERO
            }
        }
        _ if is_log(op) => G_LOG,
        // Fully dynamic: BALANCE, EXTCODESIZE, EXTCODECOPY, EXTCODEHASH,
        // SLOAD, SSTORE, CALL, CALLCODE, DELEGATECALL, STATICCALL, CREATE,
        // CREATE2, SELFDESTRUCT.
        _ => G_ZERO,
    }
}

/// Number of 32-byte words needed to hold `size` bytes.
#[must_use]
pub fn words(size: u64) -> u64 {
    (size + 31) / 32
}

/// Quadratic memory expansion cost from `from_words` to `to_words` (§3).
/// Returns `0` when `to_words <= from_words` (memory never shrinks, so this
/// also covers the "never charge twice" case the caller must otherwise
/// guard).
#[must_use]
pub fn memory_expansion_cost(from_words: u64, to_words: u64) -> u64 {
    if to_words <= from_words {
        return 0;
    }
    let cost = |w: u64| G_MEMORY * w + (w * w) / 512;
    cost(to_words) - cost(from_words)
}

/// `3` gas per word (rounded up) for `*COPY` opcodes and `KECCAK256`'s
/// per-word component.
#[must_use]
pub fn copy_word_cost(len: u64) -> u64 {
    G_COPY * words(len)
}

/// `KECCAK256`'s dynamic word cost (distinct constant from `*COPY`, though
/// equal to `2 * G_COPY` today).
#[must_use]
pub fn keccak_word_cost(len: u64) -> u64 {
    G_KECCAK256WORD * words(len)
}

/// `EXP`'s dynamic cost: `50` gas per byte of the exponent.
#[must_use]
pub fn exp_dynamic_cost(exponent_byte_len: u64) -> u64 {
    G_EXPBYTE * exponent_byte_len
}

/// `LOGn`'s dynamic cost: `375` gas per topic plus `8` gas per data byte
/// (memory expansion is charged separately by the caller).
#[must_use]
pub fn log_dynamic_cost(topic_count: u64, data_len: u64) -> u64 {
    G_LOGTOPIC * topic_count + G_LOGDATA * data_len
}

/// Cost of an address access once EIP-2929 is active.
#[must_use]
pub fn address_access_cost(is_cold: bool, spec: SpecId) -> u64 {
    if !spec.enabled_access_lists() {
        return 0; // folded into the opcode's pre-Berlin flat static cost
    }
    if is_cold {
        COLD_ACCOUNT_ACCESS_COST
    } else {
        WARM_ACCOUNT_ACCESS_COST
    }
}

/// Cost of a storage-slot access once EIP-2929 is active.
#[must_use]
pub fn storage_access_cost(is_cold: bool, spec: SpecId) -> u64 {
    if !spec.enabled_access_lists() {
        return SLOAD_FLAT_COST;
    }
    if is_cold {
        COLD_SLOAD_COST
    } else {
        WARM_STORAGE_READ_COST
    }
}

/// `BALANCE`/`EXTCODESIZE`/`EXTCODEHASH` cost pre-Berlin (flat) vs
/// post-Berlin (access-list gated, `is_cold` supplied by the host).
#[must_use]
pub fn extcode_access_cost(is_cold: bool, spec: SpecId) -> u64 {
    if !spec.enabled_access_lists() {
        return EXTCODE_FLAT_COST;
    }
    address_access_cost(is_cold, spec)
}

/// The result of pricing an `SSTORE` (§4.6, EIP-2200 amended by EIP-3529):
/// the gas to charge and the refund-counter delta (may be negative, e.g.
/// when a slot that was dirtied back to its original non-zero value had
/// earlier accrued a clears-schedule refund that must now be undone).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SstoreCost {
    pub gas: u64,
    pub refund_delta: i64,
}

/// Prices an `SSTORE` given `(original, current, new)` per the EIP-2200
/// tri-state table, amended for EIP-3529's reduced clear refund.
/// `is_cold` reports whether this is the slot's first touch this
/// transaction (EIP-2929 adds [`COLD_SLOAD_COST`] on top when so).
#[must_use]
pub fn sstore_cost(
    original: crate::Word,
    current: crate::Word,
    new: crate::Word,
    is_cold: bool,
    spec: SpecId,
) -> SstoreCost {
    let clears_schedule = if spec.enabled_reduced_refunds() {
        SSTORE_CLEARS_SCHEDULE
    } else {
        SSTORE_CLEARS_SCHEDULE_PRE_LONDON
    };
    let cold_surcharge = if spec.enabled_access_lists() && is_cold {
        COLD_SLOAD_COST
    } else {
        0
    };

    if current == new {
        let gas = if spec.enabled_access_lists() {
            WARM_STORAGE_READ_COST
        } else {
            SSTORE_NOOP_FLAT_COST
        };
        return SstoreCost {
            gas: gas + cold_surcharge,
            refund_delta: 0,
        };
    }

    if current == original {
        if original.is_zero() {
            return SstoreCost {
                gas: SSTORE_SET + cold_surcharge,
                refund_delta: 0,
            };
        }
        let reset = if spec.enabled_access_lists() {
            SSTORE_RESET
        } else {
            SSTORE_RESET_PRE_BERLIN
        };
        let refund_delta = if new.is_zero() { clears_schedule as i64 } else { 0 };
        return SstoreCost {
            gas: reset + cold_surcharge,
            refund_delta,
        };
    }

    // current != original: a "dirty" slot, already paid for once this
    // transaction. Only the refund ledger moves; gas is the warm-read
    // sentinel (plus a cold surcharge if this happens to be the first
    // touch, e.g. after a revert re-touched it).
    let mut refund_delta = 0i64;
    if !original.is_zero() {
        if current.is_zero() {
            refund_delta -= clears_schedule as i64;
        }
        if new.is_zero() {
            refund_delta += clears_schedule as i64;
        }
    }
    if new == original {
        if original.is_zero() {
            refund_delta += SSTORE_SET as i64 - WARM_STORAGE_READ_COST as i64;
        } else {
            let reset = if spec.enabled_access_lists() {
                SSTORE_RESET
            } else {
                SSTORE_RESET_PRE_BERLIN
            };
            refund_delta += reset as i64 - WARM_STORAGE_READ_COST as i64;
        }
    }
    SstoreCost {
        gas: WARM_STORAGE_READ_COST + cold_surcharge,
        refund_delta,
    }
}

/// EIP-150 "all but one 64th": the maximum gas a `CALL*`/`CREATE*` may
/// forward to the callee out of `remaining`.
#[must_use]
pub fn all_but_one_64th(remaining: u64) -> u64 {
    remaining - remaining / 64
}

/// Refund cap at transaction end: `gas_used / 5` post-London,
/// `gas_used / 2` pre-London.
#[must_use]
pub fn refund_cap(gas_used: u64, spec: SpecId) -> u64 {
    if spec.enabled_reduced_refunds() {
        gas_used / 5
    } else {
        gas_used / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_expansion_from_zero() {
        assert_eq!(memory_expansion_cost(0, 0), 0);
        assert_eq!(memory_expansion_cost(0, 1), 3);
        // 1 word -> 1 word costs nothing more.
        assert_eq!(memory_expansion_cost(1, 1), 0);
    }

    #[test]
    fn memory_expansion_quadratic_component() {
        let w = 100u64;
        let expected = G_MEMORY * w + (w * w) / 512;
        assert_eq!(memory_expansion_cost(0, w), expected);
    }

    #[test]
    fn sstore_noop_is_warm_read() {
        let c = sstore_cost(Default::default(), Default::default(), Default::default(), false, SpecId::CANCUN);
        assert_eq!(c.gas, WARM_STORAGE_READ_COST);
        assert_eq!(c.refund_delta, 0);
    }

    #[test]
    fn sstore_set_zero_to_nonzero() {
        let c = sstore_cost(
            crate::Word::ZERO,
            crate::Word::ZERO,
            crate::Word::from(1u64),
            false,
            SpecId::CANCUN,
        );
        assert_eq!(c.gas, SSTORE_SET);
        assert_eq!(c.refund_delta, 0);
    }

    #[test]
    fn sstore_clear_refund() {
        let c = sstore_cost(
            crate::Word::from(1u64),
            crate::Word::from(1u64),
            crate::Word::ZERO,
            false,
            SpecId::CANCUN,
        );
        assert_eq!(c.gas, SSTORE_RESET);
        assert_eq!(c.refund_delta, SSTORE_CLEARS_SCHEDULE as i64);
    }

    #[test]
    fn refund_caps_differ_across_london() {
        assert_eq!(refund_cap(100, SpecId::BERLIN), 50);
        assert_eq!(refund_cap(100, SpecId::LONDON), 20);
    }

    #[test]
    fn all_but_one_64th_matches_eip_150() {
        assert_eq!(all_but_one_64th(6400), 6400 - 100);
    }
}
