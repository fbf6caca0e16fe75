//! `ADD`..`SIGNEXTEND` (C9): thin stack-plumbing wrappers around the
//! pure functions in `evmcore_primitives::arithmetic` (C1). Every one of
//! these is statically priced, so the block prologue already charged
//! gas; handlers here never touch the gas meter except `EXP`, whose
//! exponent-byte surcharge is data-dependent.

use evmcore_primitives::{arithmetic, gas, opcode};

use super::DispatchResult;
use crate::interpreter::Interpreter;

pub fn binary_op(interp: &mut Interpreter<'_>, op: u8) -> DispatchResult {
    let (a, b) = match interp.frame.stack.pop2() {
        Ok(pair) => pair,
        Err(e) => return e.into(),
    };

    if op == opcode::EXP {
        let cost = gas::exp_dynamic_cost(arithmetic::byte_len(b));
        if let Some(halt) = interp.charge(cost) {
            return halt;
        }
    }

    let result = match op {
        opcode::ADD => arithmetic::add(a, b),
        opcode::SUB => arithmetic::sub(a, b),
        opcode::MUL => arithmetic::mul(a, b),
        opcode::DIV => arithmetic::div(a, b),
        opcode::SDIV => arithmetic::sdiv(a, b),
        opcode::MOD => arithmetic::rem(a, b),
        opcode::SMOD => arithmetic::smod(a, b),
        opcode::EXP => arithmetic::exp(a, b),
        opcode::SIGNEXTEND => arithmetic::signextend(a, b),
        _ => unreachable!("binary_op only called for the arithmetic binary opcodes"),
    };

    match interp.frame.stack.push(result) {
        Ok(()) => DispatchResult::Advance,
        Err(e) => e.into(),
    }
}

pub fn ternary_op(interp: &mut Interpreter<'_>, op: u8) -> DispatchResult {
    let (a, b, n) = match interp.frame.stack.pop3() {
        Ok(triple) => triple,
        Err(e) => return e.into(),
    };
    let result = match op {
        opcode::ADDMOD => arithmetic::addmod(a, b, n),
        opcode::MULMOD => arithmetic::mulmod(a, b, n),
        _ => unreachable!("ternary_op only called for ADDMOD/MULMOD"),
    };
    match interp.frame.stack.push(result) {
        Ok(()) => DispatchResult::Advance,
        Err(e) => e.into(),
    }
}
