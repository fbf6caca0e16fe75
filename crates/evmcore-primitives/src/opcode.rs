//! EVM opcode byte values and the static metadata the analyzer (C7) needs
//! about each of them: stack inputs/outputs, whether an opcode ends a
//! basic block, and PUSH immediate widths.
//!
//! Organized by functional category, matching the grouping used by the
//! `mini_instruction_table` in the broader EVM-implementation corpus this
//! engine draws its handler layout from.

#![allow(missing_docs)]

// === Stop and arithmetic (0x00-0x0B) ===
pub const STOP: u8 = 0x00;
pub const ADD: u8 = 0x01;
pub const MUL: u8 = 0x02;
pub const SUB: u8 = 0x03;
pub const DIV: u8 = 0x04;
pub const SDIV: u8 = 0x05;
pub const MOD: u8 = 0x06;
pub const SMOD: u8 = 0x07;
pub const ADDMOD: u8 = 0x08;
pub const MULMOD: u8 = 0x09;
pub const EXP: u8 = 0x0A;
pub const SIGNEXTEND: u8 = 0x0B;

// === Comparison and bitwise (0x10-0x1D) ===
pub const LT: u8 = 0x10;
pub const GT: u8 = 0x11;
pub const SLT: u8 = 0x12;
pub const SGT: u8 = 0x13;
pub const EQ: u8 = 0x14;
pub const ISZERO: u8 = 0x15;
pub const AND: u8 = 0x16;
pub const OR: u8 = 0x17;
pub const XOR: u8 = 0x18;
pub const NOT: u8 = 0x19;
pub const BYTE: u8 = 0x1A;
pub const SHL: u8 = 0x1B;
pub const SHR: u8 = 0x1C;
pub const SAR: u8 = 0x1D;

// === Hashing (0x20) ===
pub const KECCAK256: u8 = 0x20;

// === Environment (0x30-0x4A) ===
pub const ADDRESS: u8 = 0x30;
pub const BALANCE: u8 = 0x31;
pub const ORIGIN: u8 = 0x32;
pub const CALLER: u8 = 0x33;
pub const CALLVALUE: u8 = 0x34;
pub const CALLDATALOAD: u8 = 0x35;
pub const CALLDATASIZE: u8 = 0x36;
pub const CALLDATACOPY: u8 = 0x37;
pub const CODESIZE: u8 = 0x38;
pub const CODECOPY: u8 = 0x39;
pub const GASPRICE: u8 = 0x3A;
pub const EXTCODESIZE: u8 = 0x3B;
pub const EXTCODECOPY: u8 = 0x3C;
pub const RETURNDATASIZE: u8 = 0x3D;
pub const RETURNDATACOPY: u8 = 0x3E;
pub const EXTCODEHASH: u8 = 0x3F;
pub const BLOCKHASH: u8 = 0x40;
pub const COINBASE: u8 = 0x41;
pub const TIMESTAMP: u8 = 0x42;
pub const NUMBER: u8 = 0x43;
pub const PREVRANDAO: u8 = 0x44; // a.k.a. DIFFICULTY pre-Merge
pub const GASLIMIT: u8 = 0x45;
pub const CHAINID: u8 = 0x46;
pub const SELFBALANCE: u8 = 0x47;
pub const BASEFEE: u8 = 0x48;
pub const BLOBHASH: u8 = 0x49;
pub const BLOBBASEFEE: u8 = 0x4A;

// === Stack, memory, storage and control (0x50-0x5F) ===
pub const POP: u8 = 0x50;
pub const MLOAD: u8 = 0x51;
pub const MSTORE: u8 = 0x52;
pub const MSTORE8: u8 = 0x53;
pub const SLOAD: u8 = 0x54;
pub const SSTORE: u8 = 0x55;
pub const JUMP: u8 = 0x56;
pub const JUMPI: u8 = 0x57;
pub const PC: u8 = 0x58;
pub const MSIZE: u8 = 0x59;
pub const GAS: u8 = 0x5A;
pub const JUMPDEST: u8 = 0x5B;
pub const TLOAD: u8 = 0x5C;
pub const TSTORE: u8 = 0x5D;
pub const MCOPY: u8 = 0x5E;
pub const PUSH0: u8 = 0x5F;

// === Push, dup, swap (0x60-0x9F) ===
pub const PUSH1: u8 = 0x60;
pub const PUSH32: u8 = 0x7F;
pub const DUP1: u8 = 0x80;
pub const DUP16: u8 = 0x8F;
pub const SWAP1: u8 = 0x90;
pub const SWAP16: u8 = 0x9F;

// === Logging (0xA0-0xA4) ===
pub const LOG0: u8 = 0xA0;
pub const LOG1: u8 = 0xA1;
pub const LOG2: u8 = 0xA2;
pub const LOG3: u8 = 0xA3;
pub const LOG4: u8 = 0xA4;

// === System (0xF0-0xFF) ===
pub const CREATE: u8 = 0xF0;
pub const CALL: u8 = 0xF1;
pub const CALLCODE: u8 = 0xF2;
pub const RETURN: u8 = 0xF3;
pub const DELEGATECALL: u8 = 0xF4;
pub const CREATE2: u8 = 0xF5;
pub const STATICCALL: u8 = 0xFA;
pub const REVERT: u8 = 0xFD;
pub const INVALID: u8 = 0xFE;
pub const SELFDESTRUCT: u8 = 0xFF;
/// Reads 32 bytes directly from the return-data buffer onto the stack,
/// zero-padded like `CALLDATALOAD` rather than strictly bounds-checked
/// like `RETURNDATACOPY`.
pub const RETURNDATALOAD: u8 = 0xF7;

/// `true` for `PUSH1..=PUSH32`.
#[must_use]
pub fn is_push(op: u8) -> bool {
    (PUSH1..=PUSH32).contains(&op)
}

/// Number of immediate bytes a `PUSHn` consumes (`PUSH0` and non-push
/// opcodes consume none).
#[must_use]
pub fn push_immediate_len(op: u8) -> usize {
    if is_push(op) {
        (op - PUSH1 + 1) as usize
    } else {
        0
    }
}

/// `true` for `DUP1..=DUP16`.
#[must_use]
pub fn is_dup(op: u8) -> bool {
    (DUP1..=DUP16).contains(&op)
}

/// `1..=16` for `DUP1..=DUP16`.
#[must_use]
pub fn dup_n(op: u8) -> u8 {
    op - DUP1 + 1
}

/// `true` for `SWAP1..=SWAP16`.
#[must_use]
pub fn is_swap(op: u8) -> bool {
    (SWAP1..=SWAP16).contains(&op)
}

/// `1..=16` for `SWAP1..=SWAP16`.
#[must_use]
pub fn swap_n(op: u8) -> u8 {
    op - SWAP1 + 1
}

/// `true` for `LOG0..=LOG4`.
#[must_use]
pub fn is_log(op: u8) -> bool {
    (LOG0..=LOG4).contains(&op)
}

/// `0..=4` for `LOG0..=LOG4`.
#[must_use]
pub fn log_n(op: u8) -> u8 {
    op - LOG0
}

/// `true` for the opcodes that end a basic block (§4.7 Pass 1): every
/// unconditional control transfer or terminator.
#[must_use]
pub fn ends_block(op: u8) -> bool {
    matches!(
        op,
        JUMP | JUMPI | STOP | RETURN | REVERT | INVALID | SELFDESTRUCT
    )
}

/// `true` for opcodes that halt the current frame outright (terminators);
/// used by the analyzer and by the interpreter's catch-all for undefined
/// opcodes.
#[must_use]
pub fn is_terminator(op: u8) -> bool {
    matches!(op, STOP | RETURN | REVERT | INVALID | SELFDESTRUCT)
}

/// Static stack `(inputs, outputs)` for an opcode, used by the analyzer's
/// per-block stack-depth simulation (§4.7). Opcodes with data-dependent
/// arity (there are none in the base instruction set — `DUPn`/`SWAPn`/
/// `LOGn`/`PUSHn`/`CALL*`/`CREATE*` all have a fixed arity once `n` is
/// baked into the opcode byte) are covered explicitly.
#[must_use]
pub fn stack_io(op: u8) -> (u16, u16) {
    if is_push(op) {
        return (0, 1);
    }
    if is_dup(op) {
        let n = dup_n(op) as u16;
        return (n, n + 1);
    }
    if is_swap(op) {
        let n = swap_n(op) as u16 + 1;
        return (n, n);
    }
    if is_log(op) {
        let n = log_n(op) as u16;
        return (2 + n, 0);
    }
    match op {
        STOP | JUMPDEST | INVALID => (0, 0),
        ADD | MUL | SUB | DIV | SDIV | MOD | SMOD | EXP | SIGNEXTEND | LT | GT | SLT | SGT
        | EQ | AND | OR | XOR | BYTE | SHL | SHR | SAR | KECCAK256 => (2, 1),
        ADDMOD | MULMOD => (3, 1),
        ISZERO | NOT | CALLDATALOAD | EXTCODESIZE | EXTCODEHASH | BALANCE | BLOCKHASH
        | BLOBHASH | MLOAD | SLOAD | TLOAD | RETURNDATALOAD => (1, 1),
        SELFDESTRUCT => (1, 0),
        ADDRESS | ORIGIN | CALLER | CALLVALUE | CALLDATASIZE | CODESIZE | GASPRICE
        | RETURNDATASIZE | COINBASE | TIMESTAMP | NUMBER | PREVRANDAO | GASLIMIT | CHAINID
        | SELFBALANCE | BASEFEE | BLOBBASEFEE | PC | MSIZE | GAS | PUSH0 => (0, 1),
        POP => (1, 0),
        MSTORE | MSTORE8 | SSTORE | TSTORE => (2, 0),
        JUMP => (1, 0),
        JUMPI => (2, 0),
        CALLDATACOPY | CODECOPY | RETURNDATACOPY | MCOPY => (3, 0),
        EXTCODECOPY => (4, 0),
        RETURN | REVERT => (2, 0),
        CREATE => (3, 1),
        CREATE2 => (4, 1),
        CALL | CALLCODE => (7, 1),
        DELEGATECALL | STATICCALL => (6, 1),
        _ => (0, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_widths() {
        assert_eq!(push_immediate_len(PUSH1), 1);
        assert_eq!(push_immediate_len(PUSH32), 32);
        assert_eq!(push_immediate_len(ADD), 0);
    }

    #[test]
    fn dup_swap_ranges() {
        assert!(is_dup(DUP1) && is_dup(DUP16) && !is_dup(SWAP1));
        assert_eq!(dup_n(DUP1), 1);
        assert_eq!(dup_n(DUP16), 16);
        assert_eq!(swap_n(SWAP1), 1);
        assert_eq!(swap_n(SWAP16), 16);
    }

    #[test]
    fn block_enders() {
        assert!(ends_block(JUMP));
        assert!(ends_block(RETURN));
        assert!(!ends_block(ADD));
    }

    #[test]
    fn stack_io_examples() {
        assert_eq!(stack_io(ADD), (2, 1));
        assert_eq!(stack_io(ADDMOD), (3, 1));
        assert_eq!(stack_io(PUSH1), (0, 1));
        assert_eq!(stack_io(DUP1 + 2), (3, 4)); // DUP3
        assert_eq!(stack_io(SWAP1 + 1), (3, 3)); // SWAP2
        assert_eq!(stack_io(LOG2), (4, 0));
        assert_eq!(stack_io(CALL), (7, 1));
        assert_eq!(stack_io(CREATE2), (4, 1));
        assert_eq!(stack_io(BALANCE), (1, 1));
        assert_eq!(stack_io(SELFDESTRUCT), (1, 0));
    }
}
