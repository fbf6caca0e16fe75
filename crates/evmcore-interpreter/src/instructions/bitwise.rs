//! Comparison and bitwise opcodes (C9): `LT`..`SAR`, `ISZERO`, `NOT`.
//! All statically priced; no gas metering here.

use evmcore_primitives::{arithmetic, opcode, Word};

use super::DispatchResult;
use crate::interpreter::Interpreter;

pub fn binary_op(interp: &mut Interpreter<'_>, op: u8) -> DispatchResult {
    let (a, b) = match interp.frame.stack.pop2() {
        Ok(pair) => pair,
        Err(e) => return e.into(),
    };

    let result = match op {
        opcode::LT => bool_word(a < b),
        opcode::GT => bool_word(a > b),
        opcode::SLT => bool_word(signed_lt(a, b)),
        opcode::SGT => bool_word(signed_lt(b, a)),
        opcode::EQ => bool_word(a == b),
        opcode::AND => a & b,
        opcode::OR => a | b,
        opcode::XOR => a ^ b,
        opcode::BYTE => arithmetic::byte(a, b),
        opcode::SHL => arithmetic::shl(a, b),
        opcode::SHR => arithmetic::shr(a, b),
        opcode::SAR => arithmetic::sar(a, b),
        _ => unreachable!("binary_op only called for comparison/bitwise opcodes"),
    };

    match interp.frame.stack.push(result) {
        Ok(()) => DispatchResult::Advance,
        Err(e) => e.into(),
    }
}

pub fn unary_op(interp: &mut Interpreter<'_>, op: u8) -> DispatchResult {
    let a = match interp.frame.stack.pop() {
        Ok(v) => v,
        Err(e) => return e.into(),
    };
    let result = match op {
        opcode::ISZERO => bool_word(a.is_zero()),
        opcode::NOT => !a,
        _ => unreachable!("unary_op only called for ISZERO/NOT"),
    };
    match interp.frame.stack.push(result) {
        Ok(()) => DispatchResult::Advance,
        Err(e) => e.into(),
    }
}

fn bool_word(b: bool) -> Word {
    if b {
        Word::from(1u64)
    } else {
        Word::ZERO
    }
}

fn signed_lt(a: Word, b: Word) -> bool {
    let a_neg = arithmetic::is_negative(a);
    let b_neg = arithmetic::is_negative(b);
    match (a_neg, b_neg) {
        (true, false) => true,
        (false, true) => false,
        _ => a < b,
    }
}
